//! Scene simulation: ship movement, exhaust particles, and the controller
//! that owns them.
//!
//! # Invariants
//! - Movement is a no-op until the ship slot is `Ready`; the slot never reverts.
//! - Tilt is reset every frame before lateral input reapplies it.
//! - Every particle's vertical coordinate stays within `[-0.5, 0.5]`.
//! - All mutation happens in `SceneController::frame` and event handlers on one thread.

mod controller;
mod movement;
mod particles;
mod ship;
mod view;

pub use controller::{FrameReport, HostEvent, Listener, SceneController};
pub use particles::{BAND_BOTTOM, BAND_TOP, ParticleField};
pub use ship::{Ship, ShipSlot, ShipStatus};
pub use view::SceneView;
