use crate::Vec3;

/// A ray in 3D space with an origin and a direction.
///
/// Points along the ray are `origin + t * direction`. The direction is not
/// required to be unit length, so `t` is measured in multiples of it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Create a ray starting at `from` with a unit direction towards `to`.
    ///
    /// When both points coincide the direction is zero and every intersection
    /// test against it reports a miss.
    pub fn through(from: Vec3, to: Vec3) -> Self {
        Self::new(from, (to - from).normalize_or_zero())
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        }
    }
}
