//! Phong shading with hard shadows.

use crate::{Color, Intersection, Light, RenderConfig, Scene};

/// Lights closer than this to the shaded point contribute nothing.
const MIN_LIGHT_DISTANCE: f32 = 1e-6;

/// Contribution of a single light at a hit.
///
/// Zero when the light is occluded. Otherwise the ambient term plus the
/// diffuse and specular terms where they face the light, scaled by the
/// light intensity.
pub fn light_contribution(scene: &Scene, light: &Light, hit: &Intersection, config: &RenderConfig) -> Color {
    let point = hit.position();
    let to_light = light.position - point;
    let distance = to_light.length();
    if !(distance >= MIN_LIGHT_DISTANCE) {
        return Color::ZERO;
    }

    if scene.is_occluded(point, light.position, config.shadow_window) {
        return Color::ZERO;
    }

    let material = &hit.material;
    let n = hit.normal;
    let t = to_light / distance;
    let e = -hit.ray.direction().normalize_or_zero();
    let n_dot_t = n.dot(t);
    let r = n * (2.0 * n_dot_t) - t;
    let e_dot_r = e.dot(r);

    let mut color = material.ambient * light.ambient;
    if n_dot_t > 0.0 {
        color += material.diffuse * light.diffuse * n_dot_t;
    }
    if e_dot_r > 0.0 {
        color += material.specular * light.specular * e_dot_r.powf(material.shininess);
    }

    color * light.intensity
}

/// Sum of every light's contribution at a hit.
pub fn shade(scene: &Scene, hit: &Intersection, config: &RenderConfig) -> Color {
    scene
        .lights()
        .iter()
        .fold(Color::ZERO, |color, light| {
            color + light_contribution(scene, light, hit, config)
        })
}
