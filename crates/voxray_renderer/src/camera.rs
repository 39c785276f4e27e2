//! Camera for ray generation.

use voxray_core::CameraDescription;
use voxray_math::{Ray, Vec3};

/// Pinhole camera with an explicit view plane.
///
/// The view plane sits `view_plane_distance` along `direction` and spans
/// `view_plane_width` x `view_plane_height` world units, centered on the
/// camera axis. Image column `i` maps along `right = up x direction`, image
/// row `j` along `up`.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    position: Vec3,
    direction: Vec3,
    up: Vec3,
    right: Vec3,

    view_plane_distance: f32,
    view_plane_width: f32,
    view_plane_height: f32,
}

impl Camera {
    /// Create a camera at `position` looking along `direction`.
    ///
    /// `direction` and `up` are normalized; they must not be parallel.
    pub fn new(position: Vec3, direction: Vec3, up: Vec3) -> Self {
        let direction = direction.normalize_or_zero();
        let up = up.normalize_or_zero();

        Self {
            image_width: 800,
            image_height: 600,
            position,
            direction,
            up,
            right: up.cross(direction).normalize_or_zero(),
            view_plane_distance: 1.0,
            view_plane_width: 1.0,
            view_plane_height: 1.0,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set the view plane distance and size.
    pub fn with_view_plane(mut self, distance: f32, width: f32, height: f32) -> Self {
        self.view_plane_distance = distance;
        self.view_plane_width = width;
        self.view_plane_height = height;
        self
    }

    /// Build a camera from a scene description.
    pub fn from_description(desc: &CameraDescription, width: u32, height: u32) -> Self {
        Self::new(desc.position, desc.direction, desc.up)
            .with_view_plane(
                desc.view_plane_distance,
                desc.view_plane_width,
                desc.view_plane_height,
            )
            .with_resolution(width, height)
    }

    /// Get the camera position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Get the unit viewing direction.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the unit up vector.
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Get the unit right vector (`up x direction`).
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// World-space position of pixel (i, j) on the view plane.
    pub fn pixel_position(&self, i: u32, j: u32) -> Vec3 {
        self.position
            + self.direction * self.view_plane_distance
            + self.up * image_to_view_plane(j, self.image_height, self.view_plane_height)
            + self.right * image_to_view_plane(i, self.image_width, self.view_plane_width)
    }

    /// Generate the ray through pixel (i, j).
    pub fn get_ray(&self, i: u32, j: u32) -> Ray {
        Ray::through(self.position, self.pixel_position(i, j))
    }
}

/// Map a pixel index to an offset on the view plane, centered on the axis.
pub fn image_to_view_plane(n: u32, image_size: u32, plane_size: f32) -> f32 {
    n as f32 * plane_size / image_size as f32 - plane_size / 2.0
}
