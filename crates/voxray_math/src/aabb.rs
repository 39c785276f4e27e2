use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box.
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        Self { x, y, z }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Compute the parametric range over which a ray is inside the box.
    ///
    /// Uses the slab method: per axis the entry and exit parameters are
    /// computed, swapped for negative direction components, and the three
    /// ranges are intersected. The result may lie partly or entirely behind
    /// the ray origin; callers clip it to their own window.
    ///
    /// A direction component of exactly zero never divides: the ray is either
    /// inside that slab for every `t` (origin within the bounds, inclusive) or
    /// never inside it, in which case `None` is returned.
    pub fn ray_interval(&self, ray: &Ray) -> Option<Interval> {
        let mut range = Interval::UNIVERSE;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];

            if direction == 0.0 {
                if slab.contains(origin) {
                    continue;
                }
                return None;
            }

            let mut t0 = (slab.min - origin) / direction;
            let mut t1 = (slab.max - origin) / direction;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            range = range.intersect(&Interval::new(t0, t1))?;
        }

        Some(range)
    }
}
