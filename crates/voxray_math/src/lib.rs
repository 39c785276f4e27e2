//! voxray math types.
//!
//! Re-exports `glam` and adds the ray, interval and bounding box types shared
//! by the loader and the renderer.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
