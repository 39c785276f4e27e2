//! voxray core - scene data and CT volume loading.
//!
//! This crate provides:
//!
//! - **Color and material types**: `Color`, `Rgba`, `Material`
//! - **Transfer functions**: `TransferFunction`, `ColorMap`
//! - **CT volumes**: `.dat`/`.raw` loading into a `VoxelGrid`
//! - **Scene files**: JSON `SceneDescription` loading
//!
//! # Example
//!
//! ```ignore
//! use voxray_core::load_scene;
//!
//! let scene = load_scene("scenes/head.json")?;
//! println!("{} geometries, {} lights", scene.geometries.len(), scene.lights.len());
//! ```

pub mod color_map;
pub mod material;
pub mod scene;
pub mod volume;

// Re-export commonly used types
pub use color_map::{ColorMap, ColorMapEntry, TransferFunction};
pub use material::{Color, Material, Rgba};
pub use scene::{
    load_scene, CameraDescription, GeometryDescription, ImageSettings, LightDescription,
    SceneDescription, SceneError, SceneResult,
};
pub use volume::{VolumeError, VolumeMetadata, VolumeResult, VoxelGrid};
