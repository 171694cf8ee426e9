use crate::camera::RenderView;
use skyship_sim::SceneView;
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads a scene snapshot and a view configuration, then
/// produces output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene snapshot and view.
    fn render(&self, scene: &SceneView<'_>, view: &RenderView) -> Self::Output;
}

/// Headless renderer that describes the scene as text.
///
/// Used for CLI output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Number of particle positions listed individually.
    pub sample_particles: usize,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_particle_samples(sample_particles: usize) -> Self {
        Self { sample_particles }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &SceneView<'_>, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (frame={}, ship={}) ===",
            scene.frame,
            scene.status.label()
        );
        let _ = writeln!(
            out,
            "Viewport: {}x{}  Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            scene.viewport.width(),
            scene.viewport.height(),
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        );

        let held: Vec<&str> = scene.flags.held().map(|d| d.name()).collect();
        let _ = writeln!(
            out,
            "Input: [{}]",
            if held.is_empty() {
                "-".to_string()
            } else {
                held.join(",")
            }
        );

        match scene.ship {
            Some(t) => {
                let _ = writeln!(
                    out,
                    "Ship: pos=({:.2}, {:.2}, {:.2}) yaw={:.3} tilt={:.3}",
                    t.position.x, t.position.y, t.position.z, t.yaw, t.tilt
                );
            }
            None => out.push_str("Ship: <absent>\n"),
        }

        let o = scene.particle_origin;
        let _ = writeln!(
            out,
            "Particles: {} around ({:.2}, {:.2}, {:.2})",
            scene.particles.len(),
            o.x,
            o.y,
            o.z
        );
        for p in scene.particles.iter().take(self.sample_particles) {
            let _ = writeln!(out, "  ({:.3}, {:.3}, {:.3})", p[0], p[1], p[2]);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyship_assets::MeshData;
    use skyship_common::SceneConfig;
    use skyship_sim::{HostEvent, SceneController};
    use winit::keyboard::KeyCode;

    fn controller() -> SceneController {
        let mut config = SceneConfig::default();
        config.particles.count = 8;
        config.particles.seed = Some(1);
        let mut c = SceneController::new(config);
        c.attach();
        c
    }

    #[test]
    fn debug_renderer_before_load() {
        let c = controller();
        let out = DebugTextRenderer::new().render(&c.scene_view(), &RenderView::default());

        assert!(out.contains("frame=0"));
        assert!(out.contains("ship=loading"));
        assert!(out.contains("Ship: <absent>"));
        assert!(out.contains("Particles: 8"));
    }

    #[test]
    fn debug_renderer_with_ship() {
        let mut c = controller();
        c.on_ship_loaded(Ok(MeshData::default()));
        c.handle(HostEvent::KeyDown(KeyCode::KeyW));
        c.frame();

        let out = DebugTextRenderer::with_particle_samples(2)
            .render(&c.scene_view(), &RenderView::default());
        assert!(out.contains("Input: [forward]"));
        assert!(out.contains("pos=(0.00, 0.00, 34.50)"));
        assert_eq!(out.lines().filter(|l| l.starts_with("  (")).count(), 2);
    }
}
