use crate::{AssetError, MeshData, load_mesh};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Instant;

/// Load a model on a background thread and hand the result to `on_done`.
///
/// `on_done` runs on the loader thread; callers forward the result to their
/// own event loop. The callback is invoked exactly once.
pub fn spawn_load<F>(path: PathBuf, on_done: F) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce(Result<MeshData, AssetError>) + Send + 'static,
{
    std::thread::Builder::new()
        .name("model-loader".into())
        .spawn(move || {
            let _span = tracing::info_span!("model_load", path = %path.display()).entered();
            let started = Instant::now();
            let result = guarded(|| load_mesh(&path));
            match &result {
                Ok(mesh) => tracing::info!(
                    "loaded {} in {:.1?} ({} triangles)",
                    path.display(),
                    started.elapsed(),
                    mesh.triangle_count()
                ),
                Err(e) => tracing::debug!("load of {} failed: {e}", path.display()),
            }
            on_done(result);
        })
}

/// Run `load`, turning a panic into `AssetError::LoaderPanicked`.
fn guarded<F>(load: F) -> Result<MeshData, AssetError>
where
    F: FnOnce() -> Result<MeshData, AssetError>,
{
    std::panic::catch_unwind(AssertUnwindSafe(load)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".into());
        Err(AssetError::LoaderPanicked(message))
    })
}
