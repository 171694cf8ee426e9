use glam::{Mat4, Vec3};
use skyship_common::{CameraConfig, Viewport};

/// Fixed perspective camera looking at the ship's start area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), Viewport::default())
    }
}

impl RenderView {
    pub fn from_config(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            eye: config.position,
            target: config.target,
            fov_degrees: config.fov_degrees,
            aspect: viewport.aspect(),
            near: config.near,
            far: config.far,
        }
    }

    /// Recompute the projection aspect after a resize.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_view_looks_at_start() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 75.0);
        assert_eq!(view.target, Vec3::new(0.0, 0.0, 35.0));
        let vp = view.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn target_projects_to_screen_center() {
        let view = RenderView::default();
        let clip = view.view_projection() * view.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..1.0).contains(&ndc.z));
    }

    #[test]
    fn resize_updates_aspect() {
        let mut view = RenderView::default();
        view.set_viewport(Viewport::new(600, 600));
        assert_eq!(view.aspect, 1.0);
    }
}
