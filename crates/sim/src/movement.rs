use skyship_common::{MovementConfig, ShipTransform};
use skyship_input::DirectionFlags;

use crate::ship::ShipSlot;

/// Apply one frame of steering to a loaded ship's transform.
///
/// Tilt is cleared first, then each held direction is applied in
/// forward, backward, left, right order. Opposing directions cancel in
/// position; when both lateral keys are held the later one (right) sets tilt.
pub fn apply(transform: &mut ShipTransform, flags: DirectionFlags, config: &MovementConfig) {
    transform.tilt = 0.0;

    if flags.forward {
        transform.position.z -= config.speed;
    }
    if flags.backward {
        transform.position.z += config.speed;
    }
    if flags.left {
        transform.position.x -= config.speed;
        transform.tilt = -config.tilt;
    }
    if flags.right {
        transform.position.x += config.speed;
        transform.tilt = config.tilt;
    }

    transform.yaw += config.spin_rate;
}

/// Per-frame movement step. Returns `false` without touching anything while
/// the ship has not loaded.
pub fn update(slot: &mut ShipSlot, flags: DirectionFlags, config: &MovementConfig) -> bool {
    match slot.ship_mut() {
        Some(ship) => {
            apply(&mut ship.transform, flags, config);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::Ship;
    use glam::Vec3;

    fn config() -> MovementConfig {
        MovementConfig {
            speed: 0.5,
            tilt: 0.1,
            spin_rate: 0.0,
        }
    }

    fn flags(forward: bool, backward: bool, left: bool, right: bool) -> DirectionFlags {
        DirectionFlags {
            forward,
            backward,
            left,
            right,
        }
    }

    #[test]
    fn forward_frame_from_start_position() {
        let mut t = ShipTransform::at(Vec3::new(0.0, 0.0, 35.0));
        apply(&mut t, flags(true, false, false, false), &config());
        assert_eq!(t.position, Vec3::new(0.0, 0.0, 34.5));
        assert_eq!(t.tilt, 0.0);
    }

    #[test]
    fn forward_decreases_z_every_frame() {
        let mut t = ShipTransform::at(Vec3::new(0.0, 0.0, 35.0));
        for _ in 0..4 {
            let before = t.position.z;
            apply(&mut t, flags(true, false, false, false), &config());
            assert_eq!(before - t.position.z, 0.5);
        }
    }

    #[test]
    fn backward_increases_z() {
        let mut t = ShipTransform::default();
        apply(&mut t, flags(false, true, false, false), &config());
        assert_eq!(t.position.z, 0.5);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut t = ShipTransform::at(Vec3::new(3.0, 1.0, 35.0));
        apply(&mut t, flags(true, true, false, false), &config());
        assert_eq!(t.position, Vec3::new(3.0, 1.0, 35.0));

        apply(&mut t, flags(false, false, true, true), &config());
        assert_eq!(t.position, Vec3::new(3.0, 1.0, 35.0));
        assert_eq!(t.tilt, 0.1);
    }

    #[test]
    fn lateral_input_sets_tilt() {
        let mut t = ShipTransform::default();
        apply(&mut t, flags(false, false, true, false), &config());
        assert_eq!(t.tilt, -0.1);
        assert_eq!(t.position.x, -0.5);

        apply(&mut t, flags(false, false, false, true), &config());
        assert_eq!(t.tilt, 0.1);
        assert_eq!(t.position.x, 0.0);
    }

    #[test]
    fn tilt_resets_when_keys_released() {
        let mut t = ShipTransform::default();
        apply(&mut t, flags(false, false, true, false), &config());
        apply(&mut t, DirectionFlags::default(), &config());
        assert_eq!(t.tilt, 0.0);
    }

    #[test]
    fn forward_motion_does_not_tilt() {
        let mut t = ShipTransform::default();
        apply(&mut t, flags(true, false, false, false), &config());
        apply(&mut t, flags(false, true, false, false), &config());
        assert_eq!(t.tilt, 0.0);
    }

    #[test]
    fn diagonal_moves_both_axes() {
        let mut t = ShipTransform::default();
        apply(&mut t, flags(true, false, false, true), &config());
        assert_eq!(t.position, Vec3::new(0.5, 0.0, -0.5));
        assert_eq!(t.tilt, 0.1);
    }

    #[test]
    fn spin_rate_advances_yaw() {
        let mut t = ShipTransform::default();
        let cfg = MovementConfig {
            spin_rate: 0.01,
            ..config()
        };
        apply(&mut t, DirectionFlags::default(), &cfg);
        apply(&mut t, DirectionFlags::default(), &cfg);
        assert!((t.yaw - 0.02).abs() < 1e-6);
    }

    #[test]
    fn update_is_noop_before_load() {
        let mut slot = ShipSlot::NotLoaded;
        for _ in 0..10 {
            assert!(!update(&mut slot, flags(true, false, true, false), &config()));
        }
        assert!(matches!(slot, ShipSlot::NotLoaded));
    }

    #[test]
    fn update_moves_ready_ship() {
        let mut slot = ShipSlot::Ready(Ship::placeholder(Vec3::new(0.0, 0.0, 35.0)));
        assert!(update(&mut slot, flags(true, false, false, false), &config()));
        assert_eq!(
            slot.transform().map(|t| t.position),
            Some(Vec3::new(0.0, 0.0, 34.5))
        );
    }
}
