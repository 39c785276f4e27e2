//! voxray renderer - CPU ray tracing of implicit surfaces and CT volumes.
//!
//! One primary ray per pixel, nearest-hit search by linear scan, Phong
//! shading with hard shadows. Geometry is anything implementing
//! [`Intersectable`]: analytic [`Ellipsoid`]s and ray-marched
//! [`VolumetricMask`]s are provided.

mod camera;
mod ellipsoid;
mod intersection;
mod light;
mod renderer;
mod scene;
mod shading;
mod volumetric;

pub use camera::{image_to_view_plane, Camera};
pub use ellipsoid::Ellipsoid;
pub use intersection::{Intersectable, Intersection};
pub use light::Light;
pub use renderer::{
    color_to_rgba, render, render_into, render_pixel, ImageBuffer, PixelSink, RenderConfig,
};
pub use scene::Scene;
pub use shading::{light_contribution, shade};
pub use volumetric::{blend_over, VolumetricMask, ALPHA_THRESHOLD, DEPTH_BIAS};

/// Re-export scene data types from voxray_core
pub use voxray_core::{Color, ColorMap, Material, Rgba, TransferFunction, VoxelGrid};

/// Re-export Vec3 and common math types from voxray_math
pub use voxray_math::{Aabb, Interval, Ray, Vec3};
