//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read a `SceneView` and never mutate scene state.
//! - Projection always follows the current viewport aspect.
//!
//! `DebugTextRenderer` is the headless implementation used by the CLI and
//! tests; the GPU backend lives in `skyship-render-wgpu`.

mod camera;
mod renderer;

pub use camera::RenderView;
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "skyship-render v0.1.0"
}
