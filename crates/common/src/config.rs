use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading or validating a scene config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Per-frame ship motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Displacement per frame along each held axis.
    pub speed: f32,
    /// Bank angle in radians while a lateral key is held.
    pub tilt: f32,
    /// Yaw advance in radians per frame once the ship is ready.
    pub spin_rate: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 0.5,
            tilt: 0.1,
            spin_rate: 0.0,
        }
    }
}

/// Exhaust trail parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// Downward step per frame. Must stay within (0, 1] so a particle never skips the band.
    pub step: f32,
    /// Width of the square the horizontal coordinates are drawn from.
    pub spread: f32,
    /// Position of the trail relative to the ship.
    pub trail_offset: Vec3,
    /// Fixed RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            step: 0.01,
            spread: 0.4,
            trail_offset: Vec3::new(0.0, 0.0, 1.0),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    pub model_path: PathBuf,
    pub start_position: Vec3,
    pub scale: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/ship.gltf"),
            start_position: Vec3::new(0.0, 0.0, 35.0),
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 41.0),
            target: Vec3::new(0.0, 0.0, 35.0),
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Skyship".into(),
            width: 1280,
            height: 720,
        }
    }
}

/// Top-level scene configuration. Every field falls back to its default when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub ship: ShipConfig,
    pub movement: MovementConfig,
    pub particles: ParticleConfig,
    pub camera: CameraConfig,
    pub window: WindowConfig,
}

impl SceneConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.movement.speed > 0.0) {
            return Err(invalid("movement.speed", "must be positive"));
        }
        if !(self.particles.step > 0.0 && self.particles.step <= 1.0) {
            return Err(invalid("particles.step", "must be within (0, 1]"));
        }
        if self.particles.count == 0 {
            return Err(invalid("particles.count", "must be at least 1"));
        }
        if !(self.particles.spread >= 0.0) {
            return Err(invalid("particles.spread", "must not be negative"));
        }
        if !(self.ship.scale > 0.0) {
            return Err(invalid("ship.scale", "must be positive"));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window", "width and height must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
