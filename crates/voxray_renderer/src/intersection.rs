//! Intersectable trait and the Intersection record for ray-object queries.

use std::fmt;

use crate::{Color, Material};
use voxray_math::{Interval, Ray, Vec3};

/// Result of testing one ray against one geometry.
///
/// `valid` says whether the ray met the geometry at all; `visible` says
/// whether that hit contributes to shading. When `valid` is false no other
/// field is meaningful.
#[derive(Clone, Copy)]
pub struct Intersection<'a> {
    /// Whether the ray met the geometry inside the window
    pub valid: bool,
    /// Whether the hit contributes to shading
    pub visible: bool,
    /// Geometry that produced the hit
    pub geometry: Option<&'a dyn Intersectable>,
    /// Ray that was tested
    pub ray: Ray,
    /// Ray parameter of the hit
    pub t: f32,
    /// Unit surface normal at the hit
    pub normal: Vec3,
    /// Material used for shading
    pub material: Material,
    /// Surface color at the hit
    pub color: Color,
}

impl<'a> Intersection<'a> {
    /// The "no intersection" value.
    pub fn none() -> Self {
        Self {
            valid: false,
            visible: false,
            geometry: None,
            ray: Ray::default(),
            t: 0.0,
            normal: Vec3::ZERO,
            material: Material::BLACK,
            color: Color::ZERO,
        }
    }

    /// A valid, visible hit.
    pub fn hit(
        geometry: &'a dyn Intersectable,
        ray: Ray,
        t: f32,
        normal: Vec3,
        material: Material,
        color: Color,
    ) -> Self {
        Self {
            valid: true,
            visible: true,
            geometry: Some(geometry),
            ray,
            t,
            normal,
            material,
            color,
        }
    }

    /// True for valid hits that contribute to shading.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.valid && self.visible
    }

    /// World-space position of the hit.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.ray.at(self.t)
    }
}

impl Default for Intersection<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Intersection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return f.write_str("Intersection::none");
        }
        f.debug_struct("Intersection")
            .field("visible", &self.visible)
            .field("t", &self.t)
            .field("normal", &self.normal)
            .field("color", &self.color)
            .finish()
    }
}

/// Trait for geometry that can be intersected by rays.
pub trait Intersectable: Send + Sync {
    /// Find the hit of `ray` whose parameter lies strictly inside `ray_t`.
    ///
    /// Returns [`Intersection::none`] on a miss. Degenerate input (zero
    /// direction, collapsed axes) is a miss, never a NaN hit.
    ///
    /// Volumes only march inside `ray_t`, but report their hit at
    /// [`DEPTH_BIAS`](crate::DEPTH_BIAS) times the sample distance, so that
    /// `t` may fall below `ray_t.min`.
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Intersection<'_>;
}
