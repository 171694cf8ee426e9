use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Placement of the controllable ship.
///
/// `yaw` rotates about the vertical (Y) axis, `tilt` about the forward (Z) axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipTransform {
    pub position: Vec3,
    pub yaw: f32,
    pub tilt: f32,
    pub scale: f32,
}

impl Default for ShipTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            tilt: 0.0,
            scale: 1.0,
        }
    }
}

impl ShipTransform {
    /// A transform at `position` with no rotation and unit scale.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Rotation applied yaw first, then tilt in the ship's local frame.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_z(self.tilt)
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation(),
            self.position,
        )
    }
}

/// Drawable surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Zero dimensions (minimized windows) are clamped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transform_is_identity() {
        let t = ShipTransform::default();
        assert_eq!(t.model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn model_matrix_carries_translation() {
        let t = ShipTransform::at(Vec3::new(1.0, 2.0, 35.0));
        let m = t.model_matrix();
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 35.0));
    }

    #[test]
    fn positive_tilt_raises_right_wing() {
        let t = ShipTransform {
            tilt: 0.5,
            ..ShipTransform::default()
        };
        let right_wing = t.rotation() * Vec3::X;
        assert!(right_wing.y > 0.0);
    }

    #[test]
    fn viewport_clamps_zero_size() {
        let v = Viewport::new(0, 0);
        assert_eq!(v.width(), 1);
        assert_eq!(v.height(), 1);
        assert_eq!(v.aspect(), 1.0);
    }

    #[test]
    fn viewport_aspect() {
        let v = Viewport::new(1920, 1080);
        assert!((v.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
