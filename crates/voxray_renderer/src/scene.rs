//! Runtime scene: geometry list, lights and visibility queries.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use voxray_core::{GeometryDescription, Material, SceneDescription, SceneResult, VoxelGrid};
use voxray_math::{Interval, Ray, Vec3};

use crate::{Ellipsoid, Intersectable, Intersection, Light, VolumetricMask};

/// Immutable set of geometries and lights.
///
/// Intersection is a linear scan in insertion order.
pub struct Scene {
    geometries: Vec<Box<dyn Intersectable>>,
    lights: Vec<Light>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            geometries: Vec::new(),
            lights: Vec::new(),
        }
    }

    /// Add a geometry.
    pub fn add(&mut self, geometry: Box<dyn Intersectable>) {
        self.geometries.push(geometry);
    }

    /// Add a light.
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Get the lights.
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Get the number of geometries.
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Check if the scene has no geometry.
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Find the nearest visible hit along `ray` inside `ray_t`.
    ///
    /// Invalid and invisible candidates are skipped. On equal `t` the
    /// geometry added first wins.
    pub fn find_nearest(&self, ray: &Ray, ray_t: Interval) -> Intersection<'_> {
        let mut nearest = Intersection::none();

        for geometry in &self.geometries {
            let candidate = geometry.intersect(ray, ray_t);
            if !candidate.is_hit() {
                continue;
            }
            if !nearest.is_hit() || candidate.t < nearest.t {
                nearest = candidate;
            }
        }

        nearest
    }

    /// Check whether anything blocks the segment from `point` to `light_position`.
    ///
    /// The shadow ray has a unit direction so `shadow_t` is in world units;
    /// its upper bound is lowered to the light distance so geometry behind
    /// the light does not cast shadows.
    pub fn is_occluded(&self, point: Vec3, light_position: Vec3, shadow_t: Interval) -> bool {
        let ray = Ray::through(point, light_position);
        let window = shadow_t.clamp_max(point.distance(light_position));
        if window.is_empty() {
            return false;
        }

        self.find_nearest(&ray, window).valid
    }

    /// Build a scene from a description, loading every referenced volume.
    ///
    /// A volume referenced by several geometries is loaded once.
    pub fn from_description(desc: &SceneDescription) -> SceneResult<Self> {
        let mut scene = Scene::new();
        let mut volumes: HashMap<(PathBuf, PathBuf), Arc<VoxelGrid>> = HashMap::new();

        for geometry in &desc.geometries {
            match geometry {
                GeometryDescription::Ellipsoid {
                    center,
                    semi_axes,
                    radius,
                    color,
                    material,
                } => {
                    let material = material.unwrap_or_else(|| Material::from_color(*color));
                    scene.add(Box::new(Ellipsoid::new(*center, *semi_axes, *radius, material, *color)));
                }
                GeometryDescription::CtMask {
                    dat,
                    raw,
                    position,
                    scale,
                    color_map,
                } => {
                    let key = (dat.clone(), raw.clone());
                    let grid = match volumes.get(&key) {
                        Some(grid) => grid.clone(),
                        None => {
                            let grid = Arc::new(VoxelGrid::load(dat, raw)?);
                            volumes.insert(key, grid.clone());
                            grid
                        }
                    };
                    scene.add(Box::new(VolumetricMask::new(
                        *position,
                        *scale,
                        color_map.clone(),
                        grid,
                    )));
                }
            }
        }

        for light in &desc.lights {
            scene.add_light(Light::from(light));
        }

        log::debug!(
            "Built scene: {} geometries ({} volumes), {} lights",
            scene.len(),
            volumes.len(),
            scene.lights.len()
        );

        Ok(scene)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
