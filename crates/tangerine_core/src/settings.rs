use std::path::Path;

use glam::{Vec3, Vec4};
use serde::Deserialize;
use thiserror::Error;

use crate::{camera::Camera, light::Light};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read scene settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scene settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fixed scene parameters. `Default` holds the values the demo ships with;
/// every field may be overridden from JSON, missing fields keep their default.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub field_of_view_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub base_color: Vec4,
    pub light: LightSettings,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for SceneSettings {
    fn default() -> Self {
        let camera = Camera::default();
        Self {
            field_of_view_degrees: camera.fov.to_degrees(),
            near: camera.near,
            far: camera.far,
            eye: camera.eye,
            target: camera.target,
            up: camera.up,
            base_color: Vec4::new(1.0, 0.33, 0.0, 1.0),
            light: LightSettings::default(),
        }
    }
}

impl Default for LightSettings {
    fn default() -> Self {
        let light = Light::default();
        Self {
            position: light.position,
            ambient: light.ambient,
            diffuse: light.diffuse,
            specular: light.specular,
        }
    }
}

impl SceneSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads `path` if it exists, otherwise returns the built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.is_file() {
            log::debug!("no scene settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        log::info!("loading scene settings from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn camera(&self) -> Camera {
        Camera {
            fov: self.field_of_view_degrees.to_radians(),
            near: self.near,
            far: self.far,
            eye: self.eye,
            target: self.target,
            up: self.up,
        }
    }

    pub fn light(&self) -> Light {
        Light {
            position: self.light.position,
            ambient: self.light.ambient,
            diffuse: self.light.diffuse,
            specular: self.light.specular,
        }
    }
}
