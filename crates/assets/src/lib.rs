//! Asset pipeline: ship model import.
//!
//! Reads glTF 2.0 (`.gltf` with external buffers, or `.glb`) and flattens
//! every triangle primitive into a single indexed `MeshData`. The renderer
//! consumes `MeshData`, never raw files.

mod gltf;
mod loader;

pub use gltf::load_mesh;
pub use loader::spawn_load;

use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("GLB container error: {0}")]
    Glb(String),
    #[error("unsupported buffer uri: {0}")]
    UnsupportedUri(String),
    #[error("buffer {0} has no data")]
    MissingBuffer(usize),
    #[error("accessor {index}: {reason}")]
    Accessor { index: usize, reason: String },
    #[error("no triangle primitives in {0}")]
    NoTriangles(PathBuf),
    #[error("model loader panicked: {0}")]
    LoaderPanicked(String),
}

/// An indexed triangle mesh in model space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(mut lo, mut hi), p| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
            (lo, hi)
        }))
    }
}

pub fn crate_info() -> &'static str {
    "skyship-assets v0.1.0"
}
