//! Render loop and image output.
//!
//! Casts one primary ray per pixel, shades the nearest hit with every light
//! and writes the result to a [`PixelSink`].

use std::path::Path;
use std::time::Instant;

use crate::{shade, Camera, Color, Scene};
use voxray_core::SceneDescription;
use voxray_math::Interval;

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Color of pixels whose ray hits nothing
    pub background: Color,
    /// Window for primary rays
    pub view_window: Interval,
    /// Window for shadow rays, in world units from the shaded point
    pub shadow_window: Interval,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: Color::splat(0.2),
            view_window: Interval::new(0.0, 400.0),
            shadow_window: Interval::new(1.0, 1000.0),
        }
    }
}

impl From<&SceneDescription> for RenderConfig {
    fn from(desc: &SceneDescription) -> Self {
        Self {
            background: desc.background,
            ..Self::default()
        }
    }
}

/// Destination for rendered pixels.
///
/// `y` grows along the camera's up vector.
pub trait PixelSink {
    fn set_pixel(&mut self, x: u32, y: u32, color: Color);
}

/// Simple image buffer for storing render output.
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[pixel_index(self.width, x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[pixel_index(self.width, x, y)] = color;
    }

    /// Convert to RGBA bytes, top row first.
    ///
    /// Row `height - 1` (furthest along up) becomes the first row.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                bytes.extend_from_slice(&color_to_rgba(self.get(x, y)));
            }
        }
        bytes
    }

    /// Save as an 8-bit PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        let path = path.as_ref();
        image::save_buffer(
            path,
            &self.to_rgba(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )?;
        log::debug!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}

impl PixelSink for ImageBuffer {
    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        self.set(x, y, color);
    }
}

/// Row-major offset of (x, y), computed in `usize`.
fn pixel_index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Convert a color to 8-bit RGBA, clamping each channel to [0, 1].
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let c = color.clamp(Color::ZERO, Color::ONE) * 255.0;
    [c.x as u8, c.y as u8, c.z as u8, 255]
}

/// Compute the color of pixel (x, y).
pub fn render_pixel(camera: &Camera, scene: &Scene, x: u32, y: u32, config: &RenderConfig) -> Color {
    let ray = camera.get_ray(x, y);
    let hit = scene.find_nearest(&ray, config.view_window);

    if hit.is_hit() {
        shade(scene, &hit, config)
    } else {
        config.background
    }
}

/// Render every pixel of the camera's image into `sink`.
pub fn render_into(camera: &Camera, scene: &Scene, config: &RenderConfig, sink: &mut dyn PixelSink) {
    let start = Instant::now();
    log::debug!(
        "Rendering {}x{}: {} geometries, {} lights",
        camera.image_width,
        camera.image_height,
        scene.len(),
        scene.lights().len()
    );

    let mut hits = 0usize;
    for x in 0..camera.image_width {
        for y in 0..camera.image_height {
            let color = render_pixel(camera, scene, x, y, config);
            if color != config.background {
                hits += 1;
            }
            sink.set_pixel(x, y, color);
        }

        if camera.image_width >= 10 && (x + 1) % (camera.image_width / 10) == 0 {
            log::debug!("Rendered {}/{} columns", x + 1, camera.image_width);
        }
    }

    log::info!(
        "Rendered {}x{} in {:.2?} ({} non-background pixels)",
        camera.image_width,
        camera.image_height,
        start.elapsed(),
        hits
    );
}

/// Render the scene to a fresh image buffer.
pub fn render(camera: &Camera, scene: &Scene, config: &RenderConfig) -> ImageBuffer {
    let mut image = ImageBuffer::new(camera.image_width, camera.image_height);
    render_into(camera, scene, config, &mut image);
    image
}
