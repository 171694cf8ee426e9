//! Shared types and configuration for the skyship workspace.
//!
//! # Invariants
//! - Tilt is transient render state, never accumulated across frames.
//! - A `Viewport` is never smaller than 1x1.

mod config;
mod types;

pub use config::{
    CameraConfig, ConfigError, MovementConfig, ParticleConfig, SceneConfig, ShipConfig,
    WindowConfig,
};
pub use types::{ShipTransform, Viewport};
