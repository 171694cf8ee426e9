use std::collections::BTreeSet;

use skyship_assets::{AssetError, MeshData};
use skyship_common::{SceneConfig, ShipTransform, Viewport};
use skyship_input::{DirectionFlags, InputState, KeyBindings};
use winit::keyboard::KeyCode;

use crate::movement;
use crate::particles::ParticleField;
use crate::ship::{Ship, ShipSlot, ShipStatus};
use crate::view::SceneView;

/// Host events the controller can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Window focus moved away; held keys would otherwise stick.
    FocusLost,
    Resized { width: u32, height: u32 },
}

impl HostEvent {
    fn listener(&self) -> Listener {
        match self {
            HostEvent::KeyDown(_) | HostEvent::KeyUp(_) | HostEvent::FocusLost => {
                Listener::Keyboard
            }
            HostEvent::Resized { .. } => Listener::Resize,
        }
    }
}

/// A class of host event the controller listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Listener {
    Keyboard,
    Resize,
}

/// Outcome of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    /// Whether the movement step ran (ship ready).
    pub ship_updated: bool,
}

/// Owns all per-session scene state: input flags, ship slot, particles and viewport.
///
/// The frame loop calls `frame` once per redraw. Host events reach the
/// controller only through listeners registered with `attach`.
pub struct SceneController {
    config: SceneConfig,
    input: InputState,
    ship: ShipSlot,
    load_error: Option<String>,
    particles: ParticleField,
    viewport: Viewport,
    listeners: BTreeSet<Listener>,
    frame: u64,
}

impl SceneController {
    pub fn new(config: SceneConfig) -> Self {
        Self::with_bindings(config, KeyBindings::default())
    }

    pub fn with_bindings(config: SceneConfig, bindings: KeyBindings) -> Self {
        let particles = ParticleField::new(&config.particles);
        let viewport = Viewport::new(config.window.width, config.window.height);
        Self {
            config,
            input: InputState::new(bindings),
            ship: ShipSlot::NotLoaded,
            load_error: None,
            particles,
            viewport,
            listeners: BTreeSet::new(),
            frame: 0,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Register keyboard and resize listeners.
    pub fn attach(&mut self) {
        self.listeners.insert(Listener::Keyboard);
        self.listeners.insert(Listener::Resize);
        tracing::debug!("controller listeners attached");
    }

    /// Release all listeners. Held keys are dropped so nothing stays pressed.
    pub fn detach(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        self.listeners.clear();
        self.input.release_all();
        tracing::debug!("controller listeners released");
    }

    pub fn is_listening(&self, listener: Listener) -> bool {
        self.listeners.contains(&listener)
    }

    /// Dispatch a host event. Returns `false` when no listener took it.
    pub fn handle(&mut self, event: HostEvent) -> bool {
        if !self.is_listening(event.listener()) {
            return false;
        }
        match event {
            HostEvent::KeyDown(key) => self.input.on_key_down(key),
            HostEvent::KeyUp(key) => self.input.on_key_up(key),
            HostEvent::FocusLost => self.input.release_all(),
            HostEvent::Resized { width, height } => {
                self.viewport = Viewport::new(width, height);
                tracing::debug!(
                    "viewport resized to {}x{}",
                    self.viewport.width(),
                    self.viewport.height()
                );
            }
        }
        true
    }

    /// Accept the result of the one-time model load.
    ///
    /// Success places the ship at the configured start. Failure is logged and
    /// leaves the ship absent for the rest of the session. Results after the
    /// first are ignored.
    pub fn on_ship_loaded(&mut self, result: Result<MeshData, AssetError>) {
        if self.ship.is_ready() || self.load_error.is_some() {
            tracing::warn!("ship load already settled; ignoring later result");
            return;
        }
        match result {
            Ok(mesh) => {
                tracing::info!(
                    "ship ready: {} ({} triangles)",
                    mesh.name,
                    mesh.triangle_count()
                );
                let transform = ShipTransform {
                    scale: self.config.ship.scale,
                    ..ShipTransform::at(self.config.ship.start_position)
                };
                self.ship = ShipSlot::Ready(Ship::new(mesh, transform));
            }
            Err(e) => {
                tracing::error!(
                    "failed to load ship model {}: {e}",
                    self.config.ship.model_path.display()
                );
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Run one frame: movement, then the particle step.
    pub fn frame(&mut self) -> FrameReport {
        self.frame += 1;
        let ship_updated =
            movement::update(&mut self.ship, self.input.flags(), &self.config.movement);
        self.particles.step();
        tracing::trace!(frame = self.frame, ship_updated, "frame stepped");
        FrameReport {
            frame: self.frame,
            ship_updated,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn flags(&self) -> DirectionFlags {
        self.input.flags()
    }

    pub fn bindings(&self) -> &KeyBindings {
        self.input.bindings()
    }

    pub fn ship(&self) -> &ShipSlot {
        &self.ship
    }

    pub fn status(&self) -> ShipStatus {
        if self.ship.is_ready() {
            ShipStatus::Ready
        } else if self.load_error.is_some() {
            ShipStatus::Unavailable
        } else {
            ShipStatus::Loading
        }
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    /// Called by the renderer after uploading the particle buffer.
    pub fn particles_presented(&mut self) {
        self.particles.mark_clean();
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scene_view(&self) -> SceneView<'_> {
        let anchor = self
            .ship
            .transform()
            .map(|t| t.position)
            .unwrap_or(self.config.ship.start_position);
        SceneView {
            frame: self.frame,
            status: self.status(),
            ship: self.ship.transform(),
            flags: self.input.flags(),
            particle_origin: anchor + self.config.particles.trail_offset,
            particles: self.particles.positions(),
            particles_dirty: self.particles.is_dirty(),
            viewport: self.viewport,
        }
    }
}
