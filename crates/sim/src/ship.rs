use glam::Vec3;
use skyship_assets::MeshData;
use skyship_common::ShipTransform;
use std::sync::Arc;

/// The loaded, controllable ship.
#[derive(Debug, Clone)]
pub struct Ship {
    pub transform: ShipTransform,
    pub mesh: Arc<MeshData>,
}

impl Ship {
    pub fn new(mesh: MeshData, transform: ShipTransform) -> Self {
        Self {
            transform,
            mesh: Arc::new(mesh),
        }
    }

    /// A ship with an empty mesh, for headless runs.
    pub fn placeholder(position: Vec3) -> Self {
        Self::new(
            MeshData {
                name: "placeholder".into(),
                ..MeshData::default()
            },
            ShipTransform::at(position),
        )
    }
}

/// Whether the ship model has arrived yet.
///
/// Transitions once from `NotLoaded` to `Ready` and never back.
#[derive(Debug, Clone, Default)]
pub enum ShipSlot {
    #[default]
    NotLoaded,
    Ready(Ship),
}

impl ShipSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, ShipSlot::Ready(_))
    }

    pub fn ship(&self) -> Option<&Ship> {
        match self {
            ShipSlot::Ready(ship) => Some(ship),
            ShipSlot::NotLoaded => None,
        }
    }

    pub fn ship_mut(&mut self) -> Option<&mut Ship> {
        match self {
            ShipSlot::Ready(ship) => Some(ship),
            ShipSlot::NotLoaded => None,
        }
    }

    pub fn transform(&self) -> Option<&ShipTransform> {
        self.ship().map(|s| &s.transform)
    }
}

/// Load status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipStatus {
    Loading,
    Ready,
    /// Load failed; movement stays inert for the rest of the session.
    Unavailable,
}

impl ShipStatus {
    pub fn label(self) -> &'static str {
        match self {
            ShipStatus::Loading => "loading",
            ShipStatus::Ready => "ready",
            ShipStatus::Unavailable => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slot_is_not_loaded() {
        let slot = ShipSlot::default();
        assert!(!slot.is_ready());
        assert!(slot.transform().is_none());
    }

    #[test]
    fn ready_slot_exposes_transform() {
        let slot = ShipSlot::Ready(Ship::placeholder(Vec3::new(1.0, 0.0, 0.0)));
        assert!(slot.is_ready());
        assert_eq!(slot.transform().unwrap().position.x, 1.0);
    }
}
