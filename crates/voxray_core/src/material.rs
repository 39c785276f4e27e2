//! Color and Phong material types.

use serde::{Deserialize, Serialize};
use voxray_math::{Vec3, Vec4};

/// Linear RGB color (values typically 0-1).
pub type Color = Vec3;

/// Linear RGB color with opacity stored in `w`.
pub type Rgba = Vec4;

/// Phong material coefficients.
///
/// Each coefficient is multiplied component-wise with the matching light
/// coefficient during shading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::from_color(Color::splat(1.0))
    }
}

impl Material {
    /// Create a new material.
    pub fn new(ambient: Color, diffuse: Color, specular: Color, shininess: f32) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    /// Derive a material from a flat surface color.
    ///
    /// Used for geometry described by color only and for the composited color
    /// of volumetric hits.
    pub fn from_color(color: Color) -> Self {
        Self {
            ambient: color * 0.1,
            diffuse: color * 0.3,
            specular: color * 0.5,
            shininess: 100.0,
        }
    }

    /// An all-zero material that reflects nothing.
    pub const BLACK: Material = Material {
        ambient: Vec3::ZERO,
        diffuse: Vec3::ZERO,
        specular: Vec3::ZERO,
        shininess: 1.0,
    };
}
