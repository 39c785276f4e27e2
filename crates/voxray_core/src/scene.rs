//! JSON scene descriptions.
//!
//! A scene file lists the camera, the point lights and the geometry to
//! render. It is renderer-agnostic: voxel volumes are referenced by path and
//! only loaded when the renderer builds its runtime scene.
//!
//! ```json
//! {
//!   "image": { "width": 800, "height": 600 },
//!   "camera": {
//!     "position": [0, 0, -100], "direction": [0, 0, 1], "up": [0, 1, 0],
//!     "view_plane_distance": 160, "view_plane_width": 160, "view_plane_height": 120
//!   },
//!   "lights": [
//!     { "position": [60, 40, -80], "ambient": [0.8, 0.8, 0.8],
//!       "diffuse": [0.8, 0.8, 0.8], "specular": [0.8, 0.8, 0.8], "intensity": 1.0 }
//!   ],
//!   "geometries": [
//!     { "type": "ellipsoid", "center": [0, 0, 0], "semi_axes": [2, 1, 1],
//!       "radius": 10, "color": [1, 0, 0] },
//!     { "type": "ct_mask", "dat": "head.dat", "raw": "head.raw",
//!       "position": [-50, -50, 0], "scale": 0.5,
//!       "color_map": [ { "min": 40, "max": 255, "color": [1, 1, 1, 0.5] } ] }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxray_math::Vec3;

use crate::color_map::ColorMap;
use crate::material::{Color, Material};
use crate::volume::VolumeError;

/// Errors that can occur while loading a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Volume error: {0}")]
    Volume(#[from] VolumeError),

    #[error("Invalid scene: {0}")]
    Invalid(String),
}

/// Result type for scene loading.
pub type SceneResult<T> = Result<T, SceneError>;

/// Output image size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Pinhole camera with an explicit view plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraDescription {
    pub position: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    pub view_plane_distance: f32,
    pub view_plane_width: f32,
    pub view_plane_height: f32,
}

/// Point light with Phong coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightDescription {
    pub position: Vec3,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

fn default_intensity() -> f32 {
    1.0
}

/// One renderable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryDescription {
    /// Implicit ellipsoid `sum(((p - center) / semi_axes)^2) = radius^2`.
    Ellipsoid {
        center: Vec3,
        semi_axes: Vec3,
        radius: f32,
        color: Color,
        /// Defaults to [`Material::from_color`] of `color`
        #[serde(default)]
        material: Option<Material>,
    },
    /// Voxelized CT volume rendered by ray marching.
    CtMask {
        dat: PathBuf,
        raw: PathBuf,
        position: Vec3,
        scale: f32,
        color_map: ColorMap,
    },
}

/// A complete scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub image: ImageSettings,
    #[serde(default = "default_background")]
    pub background: Color,
    pub camera: CameraDescription,
    #[serde(default)]
    pub lights: Vec<LightDescription>,
    #[serde(default)]
    pub geometries: Vec<GeometryDescription>,
}

fn default_background() -> Color {
    Color::splat(0.2)
}

impl SceneDescription {
    /// Parse and validate a scene from JSON text.
    ///
    /// Volume paths are kept as written.
    pub fn from_json(content: &str) -> SceneResult<Self> {
        let scene: SceneDescription = serde_json::from_str(content)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check values that would make rendering meaningless.
    pub fn validate(&self) -> SceneResult<()> {
        if self.image.width == 0 || self.image.height == 0 {
            return Err(SceneError::Invalid(format!(
                "image size {}x{} must be non-zero",
                self.image.width, self.image.height
            )));
        }

        let camera = &self.camera;
        if camera.direction.length_squared() == 0.0 || camera.up.length_squared() == 0.0 {
            return Err(SceneError::Invalid(
                "camera direction and up must be non-zero".to_string(),
            ));
        }
        if camera.up.cross(camera.direction).length_squared() == 0.0 {
            return Err(SceneError::Invalid(
                "camera up must not be parallel to its direction".to_string(),
            ));
        }

        for (index, geometry) in self.geometries.iter().enumerate() {
            if let GeometryDescription::CtMask { scale, .. } = geometry {
                if !scale.is_finite() || *scale <= 0.0 {
                    return Err(SceneError::Invalid(format!(
                        "geometry {index}: ct_mask scale must be positive, got {scale}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Make relative volume paths relative to `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        for geometry in &mut self.geometries {
            if let GeometryDescription::CtMask { dat, raw, .. } = geometry {
                *dat = resolve_path(base_dir, dat);
                *raw = resolve_path(base_dir, raw);
            }
        }
    }
}

/// Load a scene file, resolving volume paths against its directory.
pub fn load_scene(path: impl AsRef<Path>) -> SceneResult<SceneDescription> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut scene = SceneDescription::from_json(&content)?;

    if let Some(base_dir) = path.parent() {
        scene.resolve_paths(base_dir);
    }

    log::debug!(
        "Loaded scene {}: {} geometries, {} lights",
        path.display(),
        scene.geometries.len(),
        scene.lights.len()
    );

    Ok(scene)
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
