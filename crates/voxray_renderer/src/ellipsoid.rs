//! Ellipsoid primitive for ray tracing.

use crate::{Color, Intersectable, Intersection, Material};
use voxray_math::{Interval, Ray, Vec3};

/// An implicit ellipsoid.
///
/// The surface is the set of points `p` with
/// `sum(((p - center)_i / semi_axes_i)^2) = radius^2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    center: Vec3,
    semi_axes: Vec3,
    radius: f32,
    material: Material,
    color: Color,
}

impl Ellipsoid {
    /// Create a new ellipsoid.
    pub fn new(center: Vec3, semi_axes: Vec3, radius: f32, material: Material, color: Color) -> Self {
        Self {
            center,
            semi_axes,
            radius,
            material,
            color,
        }
    }

    /// Create an ellipsoid whose material is derived from its color.
    pub fn with_color(center: Vec3, semi_axes: Vec3, radius: f32, color: Color) -> Self {
        Self::new(center, semi_axes, radius, Material::from_color(color), color)
    }

    /// Create a sphere.
    pub fn sphere(center: Vec3, radius: f32, material: Material, color: Color) -> Self {
        Self::new(center, Vec3::ONE, radius, material, color)
    }

    /// Get the center point.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Unit outward normal at a point on the surface.
    ///
    /// This is the normalized gradient `2 (p - center) / semi_axes^2`.
    pub fn normal_at(&self, p: Vec3) -> Vec3 {
        ((p - self.center) * 2.0 / (self.semi_axes * self.semi_axes)).normalize_or_zero()
    }

    /// Coefficients of `a t^2 + b t + c = 0` for the given ray.
    fn quadratic(&self, ray: &Ray) -> (f32, f32, f32) {
        let inv_sq = (self.semi_axes * self.semi_axes).recip();
        let d = ray.direction();
        let u = ray.origin() - self.center;

        let a = (d * d * inv_sq).element_sum();
        let b = 2.0 * (d * u * inv_sq).element_sum();
        let c = (u * u * inv_sq).element_sum() - self.radius * self.radius;
        (a, b, c)
    }
}

impl Intersectable for Ellipsoid {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Intersection<'_> {
        let (a, b, c) = self.quadratic(ray);

        // Zero direction or collapsed/infinite axes
        if !a.is_finite() || a < f32::MIN_POSITIVE {
            return Intersection::none();
        }

        // Tangent rays count as misses; NaN fails this test too
        let discriminant = b * b - 4.0 * a * c;
        if !(discriminant > 0.0) {
            return Intersection::none();
        }

        let sqrtd = discriminant.sqrt();
        let t1 = (-b - sqrtd) / (2.0 * a);
        let t2 = (-b + sqrtd) / (2.0 * a);

        // Find the nearest root in the acceptable range
        let root = if ray_t.surrounds(t1) {
            t1
        } else if ray_t.surrounds(t2) {
            t2
        } else {
            return Intersection::none();
        };

        let normal = self.normal_at(ray.at(root));
        Intersection::hit(self, *ray, root, normal, self.material, self.color)
    }
}
