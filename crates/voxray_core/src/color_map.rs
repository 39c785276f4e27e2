//! Transfer functions mapping voxel intensities to color and opacity.

use serde::{Deserialize, Serialize};

use crate::material::Rgba;

/// Maps a scalar voxel intensity to a color with opacity.
///
/// The returned alpha (`w`) must be in [0, 1]. An alpha of exactly 0 marks
/// the intensity as empty space.
pub trait TransferFunction: Send + Sync {
    fn map_intensity(&self, value: u8) -> Rgba;
}

impl<F> TransferFunction for F
where
    F: Fn(u8) -> Rgba + Send + Sync,
{
    fn map_intensity(&self, value: u8) -> Rgba {
        self(value)
    }
}

/// One inclusive intensity range of a [`ColorMap`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorMapEntry {
    pub min: u8,
    pub max: u8,
    pub color: Rgba,
}

/// Piecewise-constant transfer function.
///
/// Ranges are checked in insertion order and the first one containing the
/// intensity wins. Intensities outside every range are fully transparent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ColorMapEntry>", into = "Vec<ColorMapEntry>")]
pub struct ColorMap {
    entries: Vec<ColorMapEntry>,
}

impl ColorMap {
    /// Create an empty color map (everything transparent).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range mapping `min..=max` to `color`.
    pub fn with_range(mut self, min: u8, max: u8, color: Rgba) -> Self {
        self.entries.push(ColorMapEntry {
            min: min.min(max),
            max: min.max(max),
            color: color.clamp(Rgba::ZERO, Rgba::ONE),
        });
        self
    }

    /// Get the ranges in lookup order.
    pub fn entries(&self) -> &[ColorMapEntry] {
        &self.entries
    }

    /// Get the number of ranges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map has no ranges.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TransferFunction for ColorMap {
    fn map_intensity(&self, value: u8) -> Rgba {
        self.entries
            .iter()
            .find(|entry| entry.min <= value && value <= entry.max)
            .map(|entry| entry.color)
            .unwrap_or(Rgba::ZERO)
    }
}

impl From<Vec<ColorMapEntry>> for ColorMap {
    fn from(entries: Vec<ColorMapEntry>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<ColorMap> for Vec<ColorMapEntry> {
    fn from(map: ColorMap) -> Self {
        map.entries
    }
}

impl FromIterator<ColorMapEntry> for ColorMap {
    fn from_iter<I: IntoIterator<Item = ColorMapEntry>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ColorMap::new(), |map, e| map.with_range(e.min, e.max, e.color))
    }
}
