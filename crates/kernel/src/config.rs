//! Pasture configuration: physics constants, camera parameters, herd makeup.
//!
//! Loaded from YAML or JSON (picked by file extension). Every field has a
//! default, so a config file only needs to name what it overrides.

use paturage_common::TAU;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Upward acceleration used when gravity is inverted.
pub const INVERTED_GRAVITY: f32 = 0.3;

/// Largest herd a config may ask for.
pub const MAX_HERD_SIZE: u32 = u16::MAX as u32;

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0:?} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Cow breed. Picks the mesh and texture a cow is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breed {
    Holstein,
    Jersey,
    BlancBleuBelge,
}

impl Breed {
    pub const ALL: [Breed; 3] = [Breed::Holstein, Breed::Jersey, Breed::BlancBleuBelge];

    pub fn name(self) -> &'static str {
        match self {
            Breed::Holstein => "Holstein",
            Breed::Jersey => "Jersey",
            Breed::BlancBleuBelge => "Blanc Bleu Belge",
        }
    }

    /// File stem used for the breed's texture.
    pub fn texture_stem(self) -> &'static str {
        match self {
            Breed::Holstein => "holstein",
            Breed::Jersey => "jersey",
            Breed::BlancBleuBelge => "bbb",
        }
    }
}

/// Physics constants shared by every cow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration (negative pulls down).
    pub gravity: f32,
    /// Replace gravity with a weak upward pull.
    pub invert_gravity: bool,
    /// Height of a voluntary jump.
    pub jump_height: f32,
    /// Half side length of the square pasture.
    pub bounds: f32,
    /// Multiplier on the base walking speed of 3.
    pub speed_multiplier: f32,
    /// Rate at which a cow turns toward its target heading.
    pub heading_smoothing: f32,
    /// Expected voluntary jumps per second while grounded.
    pub jump_rate: f32,
    /// Horizontal drag while airborne.
    pub air_drag: f32,
    /// Vertical drag while falling (none while rising).
    pub fall_drag: f32,
    /// Drag on every axis while grounded.
    pub ground_drag: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -32.0,
            invert_gravity: false,
            jump_height: 0.7,
            bounds: 2.3,
            speed_multiplier: 1.0,
            heading_smoothing: 5.0,
            jump_rate: 0.5,
            air_drag: 1.8,
            fall_drag: 0.4,
            ground_drag: 3.0,
        }
    }
}

impl PhysicsConfig {
    /// Gravity actually applied, after inversion.
    pub fn effective_gravity(&self) -> f32 {
        if self.invert_gravity {
            INVERTED_GRAVITY
        } else {
            self.gravity
        }
    }

    pub fn speed(&self) -> f32 {
        3.0 * self.speed_multiplier
    }
}

/// Orbiting camera and field-of-view easing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Field of view at startup, in radians.
    pub initial_fov: f32,
    /// Field of view the camera eases toward.
    pub target_fov: f32,
    /// Field of view snapped to on click.
    pub click_fov: f32,
    pub fov_easing: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the camera to the pasture centre.
    pub distance: f32,
    pub pitch: f32,
    /// Orbit speed in radians per second.
    pub orbit_rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_fov: TAU / 5.0,
            target_fov: TAU / 4.0,
            click_fov: TAU / 4.3,
            fov_easing: 5.0,
            near: 2.0,
            far: 20.0,
            distance: 6.0,
            pitch: -0.5,
            orbit_rate: 1.0 / 3.0,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PastureConfig {
    pub physics: PhysicsConfig,
    pub camera: CameraConfig,
    /// Number of cows of each breed.
    pub herd: BTreeMap<Breed, u32>,
}

impl Default for PastureConfig {
    fn default() -> Self {
        let herd = BTreeMap::from([
            (Breed::Holstein, 9),
            (Breed::Jersey, 5),
            (Breed::BlancBleuBelge, 3),
        ]);
        Self {
            physics: PhysicsConfig::default(),
            camera: CameraConfig::default(),
            herd,
        }
    }
}

impl PastureConfig {
    /// Load and validate a config file. The format follows the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config: Self = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&text)?,
            "json" => serde_json::from_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), cows = config.herd_size(), "config loaded");
        Ok(config)
    }

    /// Total number of cows across all breeds, saturating at `u32::MAX`.
    pub fn herd_size(&self) -> u32 {
        self.herd.values().fold(0u32, |total, &n| total.saturating_add(n))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        let c = &self.camera;

        let finite = [
            ("physics.gravity", p.gravity),
            ("physics.jump_height", p.jump_height),
            ("physics.bounds", p.bounds),
            ("physics.speed_multiplier", p.speed_multiplier),
            ("physics.heading_smoothing", p.heading_smoothing),
            ("physics.jump_rate", p.jump_rate),
            ("physics.air_drag", p.air_drag),
            ("physics.fall_drag", p.fall_drag),
            ("physics.ground_drag", p.ground_drag),
            ("camera.initial_fov", c.initial_fov),
            ("camera.target_fov", c.target_fov),
            ("camera.click_fov", c.click_fov),
            ("camera.fov_easing", c.fov_easing),
            ("camera.distance", c.distance),
            ("camera.pitch", c.pitch),
            ("camera.orbit_rate", c.orbit_rate),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be finite")));
        }

        if p.bounds <= 0.0 {
            return Err(ConfigError::Invalid("physics.bounds must be positive".into()));
        }
        if p.jump_height <= 0.0 {
            return Err(ConfigError::Invalid(
                "physics.jump_height must be positive".into(),
            ));
        }
        if p.jump_rate < 0.0 || p.air_drag < 0.0 || p.fall_drag < 0.0 || p.ground_drag < 0.0 {
            return Err(ConfigError::Invalid(
                "physics rates and drag coefficients must not be negative".into(),
            ));
        }
        if !(c.near > 0.0 && c.near < c.far) {
            return Err(ConfigError::Invalid(
                "camera planes must satisfy 0 < near < far".into(),
            ));
        }
        let total = self
            .herd
            .values()
            .try_fold(0u32, |total, &n| total.checked_add(n));
        if !total.is_some_and(|n| n <= MAX_HERD_SIZE) {
            return Err(ConfigError::Invalid(format!(
                "herd may hold at most {MAX_HERD_SIZE} cows"
            )));
        }
        for fov in [c.initial_fov, c.target_fov, c.click_fov] {
            if fov <= 0.0 || fov >= std::f32::consts::PI {
                return Err(ConfigError::Invalid(
                    "camera field of view must be in (0, pi)".into(),
                ));
            }
        }
        Ok(())
    }
}
