//! Point lights.

use voxray_core::{Color, LightDescription};
use voxray_math::Vec3;

/// A point light with Phong coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub intensity: f32,
}

impl Light {
    /// Create a new light.
    pub fn new(position: Vec3, ambient: Color, diffuse: Color, specular: Color, intensity: f32) -> Self {
        Self {
            position,
            ambient,
            diffuse,
            specular,
            intensity,
        }
    }

    /// A light using `color` for all three coefficients.
    pub fn uniform(position: Vec3, color: Color, intensity: f32) -> Self {
        Self::new(position, color, color, color, intensity)
    }
}

impl From<&LightDescription> for Light {
    fn from(desc: &LightDescription) -> Self {
        Self::new(desc.position, desc.ambient, desc.diffuse, desc.specular, desc.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_light() {
        let light = Light::uniform(Vec3::new(1.0, 2.0, 3.0), Color::splat(0.5), 2.0);

        assert_eq!(light.ambient, Color::splat(0.5));
        assert_eq!(light.diffuse, light.ambient);
        assert_eq!(light.specular, light.ambient);
        assert_eq!(light.intensity, 2.0);
    }

    #[test]
    fn test_from_description() {
        let desc = LightDescription {
            position: Vec3::new(0.0, 10.0, 0.0),
            ambient: Color::splat(0.1),
            diffuse: Color::splat(0.6),
            specular: Color::ONE,
            intensity: 0.75,
        };
        let light = Light::from(&desc);

        assert_eq!(light.position, desc.position);
        assert_eq!(light.diffuse, Color::splat(0.6));
        assert_eq!(light.intensity, 0.75);
    }
}
