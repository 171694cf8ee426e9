//! wgpu render backend for the skyship scene.
//!
//! Draws the lit ship mesh (once loaded) and the exhaust particles as a point
//! list anchored behind the ship.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - The particle buffer is re-uploaded only when the scene marks it dirty.
//! - Depth target always matches the surface size.

mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
