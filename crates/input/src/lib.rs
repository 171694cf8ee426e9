//! Input: key bindings mapped to shared direction actions.
//!
//! # Invariants
//! - Raw key codes never reach the simulation; only `Action`s do.
//! - Unbound keys are ignored, never an error.
//! - Any subset of directions may be held at once.

mod action;
mod state;

pub use action::{Action, Direction, KeyBindings};
pub use state::{DirectionFlags, InputState};
