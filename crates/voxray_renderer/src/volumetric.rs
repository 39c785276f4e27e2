//! Ray-marched CT volumes.
//!
//! A [`VolumetricMask`] places a [`VoxelGrid`] in world space and renders it
//! by stepping through the grid's bounding box, mapping each visited voxel
//! through a transfer function and compositing the samples front to back.
//! The result is reported as a single surface-like hit so it can be shaded
//! like any other geometry.

use std::sync::Arc;

use voxray_core::{ColorMap, Material, Rgba, TransferFunction, VoxelGrid};
use voxray_math::{Aabb, IVec3, Interval, Ray, Vec3};

use crate::{Intersectable, Intersection};

/// Accumulated opacity below which the volume counts as missed.
pub const ALPHA_THRESHOLD: f32 = 0.01;

/// Depth bias applied to the distance of the first contributing sample.
///
/// Pulls the apparent surface towards the camera since compositing starts
/// before the volume is opaque.
pub const DEPTH_BIAS: f32 = 0.91;

/// A voxel grid rendered with a transfer function.
pub struct VolumetricMask<T: TransferFunction = ColorMap> {
    position: Vec3,
    scale: f32,
    transfer: T,
    grid: Arc<VoxelGrid>,
    bbox: Aabb,
}

impl<T: TransferFunction> VolumetricMask<T> {
    /// Place `grid` with its minimum corner at `position`.
    ///
    /// `scale` multiplies the grid's physical voxel size.
    pub fn new(position: Vec3, scale: f32, transfer: T, grid: Arc<VoxelGrid>) -> Self {
        let bbox = Aabb::from_points(position, position + grid.extent() * scale);

        Self {
            position,
            scale,
            transfer,
            grid,
            bbox,
        }
    }

    /// World-space bounds of the grid.
    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Voxel indices containing a world-space point.
    fn voxel_index(&self, p: Vec3) -> IVec3 {
        ((p - self.position) / self.grid.thickness() / self.scale)
            .floor()
            .as_ivec3()
    }

    fn value(&self, idx: IVec3) -> u8 {
        self.grid.value(idx.x, idx.y, idx.z)
    }

    /// Unit normal from the central difference of intensities around `idx`.
    ///
    /// Each component is `value(idx + 1) - value(idx - 1)`, so the normal
    /// follows the intensity gradient towards denser voxels. Zero when the
    /// neighbourhood is uniform.
    fn local_normal(&self, idx: IVec3) -> Vec3 {
        let diff = |offset: IVec3| {
            self.value(idx + offset) as f32 - self.value(idx - offset) as f32
        };
        Vec3::new(diff(IVec3::X), diff(IVec3::Y), diff(IVec3::Z)).normalize_or_zero()
    }
}

/// Blend a new sample behind the accumulated color.
///
/// `alpha' = min(acc_a + s_a (1 - acc_a), 1)` and every color channel becomes
/// `min((s_c acc_a + acc_c s_a (1 - acc_a)) / alpha', 1)`. `sample.w` must be
/// positive.
pub fn blend_over(accumulated: Rgba, sample: Rgba) -> Rgba {
    let acc_alpha = accumulated.w;
    let sample_alpha = sample.w;

    let alpha = (acc_alpha + sample_alpha * (1.0 - acc_alpha)).min(1.0);
    let rgb = (sample.truncate() * acc_alpha
        + accumulated.truncate() * sample_alpha * (1.0 - acc_alpha))
        / alpha;

    rgb.min(Vec3::ONE).extend(alpha)
}

impl<T: TransferFunction> Intersectable for VolumetricMask<T> {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Intersection<'_> {
        let direction_length = ray.direction().length();
        if !(direction_length > 0.0) {
            return Intersection::none();
        }

        let Some(range) = self
            .bbox
            .ray_interval(ray)
            .and_then(|range| range.intersect(&ray_t))
        else {
            return Intersection::none();
        };

        let entry = ray.at(range.min);
        let exit = ray.at(range.max);
        let step = ray.direction() / direction_length;
        let steps = (exit - entry).length().floor() as usize;

        let mut position = entry;
        let mut last_index = None;
        let mut accumulated = Rgba::ZERO;
        let mut normal = Vec3::ZERO;
        let mut distance = 0.0;

        for _ in 0..steps {
            position += step;

            let index = self.voxel_index(position);
            if last_index == Some(index) {
                continue;
            }
            last_index = Some(index);

            let sample = self
                .transfer
                .map_intensity(self.value(index))
                .clamp(Rgba::ZERO, Rgba::ONE);
            if sample.w == 0.0 {
                continue;
            }

            // Distance is fixed by the first sample that makes the volume visible
            if accumulated.w < ALPHA_THRESHOLD {
                distance = DEPTH_BIAS * (position - ray.origin()).length() / direction_length;
            }

            accumulated = blend_over(accumulated, sample);
            normal = (normal + self.local_normal(index)).normalize_or_zero();

            if accumulated.w >= 1.0 {
                break;
            }
        }

        if accumulated.w < ALPHA_THRESHOLD {
            return Intersection::none();
        }

        if normal == Vec3::ZERO {
            normal = -step;
        }

        let color = accumulated.truncate();
        Intersection::hit(
            self,
            *ray,
            distance,
            normal,
            Material::from_color(color),
            color,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 10x10x10 unit voxels at the origin, every voxel set to `value`.
    fn cube(value: u8) -> Arc<VoxelGrid> {
        Arc::new(VoxelGrid::filled([10, 10, 10], Vec3::ONE, value))
    }

    fn translucent_red() -> ColorMap {
        ColorMap::new().with_range(100, 255, Rgba::new(1.0, 0.0, 0.0, 0.5))
    }

    #[test]
    fn test_bounding_box_uses_thickness_and_scale() {
        let grid = Arc::new(VoxelGrid::filled([4, 3, 2], Vec3::new(0.5, 1.0, 2.0), 0));
        let mask = VolumetricMask::new(Vec3::new(1.0, 1.0, 1.0), 2.0, ColorMap::new(), grid);
        let bbox = mask.bounding_box();

        assert_eq!(bbox.min(), Vec3::ONE);
        assert_eq!(bbox.max(), Vec3::new(5.0, 7.0, 9.0));
    }

    #[test]
    fn test_translucent_volume_hit() {
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, translucent_red(), cube(200));
        let ray = Ray::new(Vec3::new(5.5, 5.5, -10.0), Vec3::Z);
        let hit = mask.intersect(&ray, Interval::new(0.0, 400.0));

        assert!(hit.is_hit());
        // First sample lands one step past the entry at z=1, 11 units from the origin
        assert!((hit.t - DEPTH_BIAS * 11.0).abs() < 1e-4);
        assert!(hit.color.x > 0.0 && hit.color.x <= 1.0);
        assert_eq!(hit.color.y, 0.0);
        assert!((hit.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_distance_is_relative_to_direction_length() {
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, translucent_red(), cube(200));
        let unit = Ray::new(Vec3::new(5.5, 5.5, -10.0), Vec3::Z);
        let long = Ray::new(Vec3::new(5.5, 5.5, -10.0), Vec3::new(0.0, 0.0, 4.0));

        let a = mask.intersect(&unit, Interval::new(0.0, 400.0));
        let b = mask.intersect(&long, Interval::new(0.0, 400.0));
        assert!((a.t - 4.0 * b.t).abs() < 1e-4);
        assert!((a.position() - b.position()).length() < 1e-3);
    }

    #[test]
    fn test_fully_transparent_volume_never_hits() {
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, ColorMap::new(), cube(255));
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..200 {
            let origin = Vec3::new(
                rng.gen_range(-20.0..30.0),
                rng.gen_range(-20.0..30.0),
                rng.gen_range(-20.0..30.0),
            );
            let target = Vec3::new(
                rng.gen_range(0.0..10.0),
                rng.gen_range(0.0..10.0),
                rng.gen_range(0.0..10.0),
            );
            let ray = Ray::through(origin, target);
            assert!(!mask.intersect(&ray, Interval::new(0.0, 400.0)).valid);
        }
    }

    #[test]
    fn test_ray_missing_box() {
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, translucent_red(), cube(200));
        let ray = Ray::new(Vec3::new(20.0, 5.0, -10.0), Vec3::Z);

        assert!(!mask.intersect(&ray, Interval::new(0.0, 400.0)).valid);
    }

    #[test]
    fn test_axis_parallel_ray_outside_slab() {
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, translucent_red(), cube(200));

        // Zero x and y direction with x outside the slab
        let ray = Ray::new(Vec3::new(-1.0, 5.0, -10.0), Vec3::Z);
        let hit = mask.intersect(&ray, Interval::new(0.0, 400.0));
        assert!(!hit.valid);
        assert!(!hit.t.is_nan());

        // Exactly on the min x bound: the guard keeps it NaN-free
        let ray = Ray::new(Vec3::new(0.0, 5.0, -10.0), Vec3::Z);
        let hit = mask.intersect(&ray, Interval::new(0.0, 400.0));
        assert!(!hit.t.is_nan());
        assert!(!hit.normal.is_nan());
    }

    #[test]
    fn test_window_clips_march() {
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, translucent_red(), cube(200));
        let ray = Ray::new(Vec3::new(5.5, 5.5, -10.0), Vec3::Z);

        // Window ends before the box starts
        assert!(!mask.intersect(&ray, Interval::new(0.0, 9.0)).valid);

        // Window starts halfway through the box
        let window = Interval::new(15.0, 400.0);
        let hit = mask.intersect(&ray, window);
        assert!(hit.is_hit());
        assert!((hit.t - DEPTH_BIAS * 16.0).abs() < 1e-4);
        // The depth bias pulls the reported hit in front of the window
        assert!(hit.t < window.min);
    }

    #[test]
    fn test_opaque_surface_normal_and_early_exit() {
        // Dense half-space for x >= 5
        let grid = Arc::new(VoxelGrid::from_fn([10, 3, 3], Vec3::ONE, |x, _, _| {
            if x >= 5 { 200 } else { 0 }
        }));
        let lookups = AtomicUsize::new(0);
        let opaque = |v: u8| {
            lookups.fetch_add(1, Ordering::Relaxed);
            if v >= 100 {
                Rgba::new(1.0, 1.0, 1.0, 1.0)
            } else {
                Rgba::ZERO
            }
        };
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, opaque, grid);
        let ray = Ray::new(Vec3::new(-10.0, 1.5, 1.5), Vec3::X);
        let hit = mask.intersect(&ray, Interval::new(0.0, 400.0));

        assert!(hit.is_hit());
        assert!((hit.t - DEPTH_BIAS * 15.0).abs() < 1e-4);
        // Gradient points into the dense half-space
        assert!((hit.normal - Vec3::X).length() < 1e-5);
        // Voxels 1..=5 are visited, then the opaque sample stops the march
        assert_eq!(lookups.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_repeated_voxels_are_sampled_once() {
        // 4-unit voxels: unit steps land in each voxel several times
        let grid = Arc::new(VoxelGrid::filled([2, 2, 2], Vec3::splat(4.0), 200));
        let lookups = AtomicUsize::new(0);
        let faint = |_: u8| {
            lookups.fetch_add(1, Ordering::Relaxed);
            Rgba::new(1.0, 1.0, 1.0, 0.1)
        };
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, faint, grid);
        let ray = Ray::new(Vec3::new(2.0, 2.0, -10.0), Vec3::Z);
        let hit = mask.intersect(&ray, Interval::new(0.0, 400.0));

        assert!(hit.is_hit());
        // z = 1..=8 covers voxel 0, voxel 1 and the outside index 2
        assert_eq!(lookups.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_faint_volume_below_threshold_is_a_miss() {
        let map = ColorMap::new().with_range(1, 255, Rgba::new(1.0, 1.0, 1.0, 0.001));
        let mask = VolumetricMask::new(Vec3::ZERO, 1.0, map, cube(50));
        let ray = Ray::new(Vec3::new(5.5, 5.5, -10.0), Vec3::Z);

        // Nine samples of 0.001 stay below 0.01
        assert!(!mask.intersect(&ray, Interval::new(0.0, 400.0)).valid);
    }

    #[test]
    fn test_blend_over_alpha_is_monotonic_and_bounded() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            let mut accumulated = Rgba::ZERO;
            for _ in 0..40 {
                let sample = Rgba::new(
                    rng.gen_range(0.0..=1.0),
                    rng.gen_range(0.0..=1.0),
                    rng.gen_range(0.0..=1.0),
                    rng.gen_range(0.001..=1.0),
                );
                let next = blend_over(accumulated, sample);

                assert!(next.w >= accumulated.w);
                assert!(next.w <= 1.0);
                assert!(next.truncate().max_element() <= 1.0);
                assert!(next.truncate().min_element() >= 0.0);
                accumulated = next;
            }
        }
    }

    #[test]
    fn test_blend_over_values() {
        let first = blend_over(Rgba::ZERO, Rgba::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(first.w, 0.5);
        // Nothing accumulated yet, so the sample color is weighted by zero
        assert_eq!(first.truncate(), Vec3::ZERO);

        let second = blend_over(first, Rgba::new(1.0, 0.0, 0.0, 0.5));
        assert!((second.w - 0.75).abs() < 1e-6);
        assert!((second.x - 0.5 / 0.75).abs() < 1e-6);
    }
}
