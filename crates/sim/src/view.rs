use glam::Vec3;
use skyship_common::{ShipTransform, Viewport};
use skyship_input::DirectionFlags;

use crate::ship::ShipStatus;

/// Read-only snapshot of everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    pub frame: u64,
    pub status: ShipStatus,
    /// Present only once the ship is ready.
    pub ship: Option<&'a ShipTransform>,
    pub flags: DirectionFlags,
    /// World-space origin the particle positions are relative to.
    pub particle_origin: Vec3,
    pub particles: &'a [[f32; 3]],
    pub particles_dirty: bool,
    pub viewport: Viewport,
}
