//! CT voxel volumes.
//!
//! A volume is described by a small `.dat` metadata file and a `.raw` file
//! holding one byte per voxel. The metadata lines look like:
//!
//! ```text
//! ObjectFileName: head.raw
//! Resolution:     256 256 113
//! SliceThickness: 0.9 0.9 1.0
//! ```
//!
//! Only `Resolution` and `SliceThickness` are read; other keys are ignored.

use std::fs;
use std::path::Path;

use thiserror::Error;
use voxray_math::Vec3;

/// Errors that can occur while loading a voxel volume.
#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing metadata key: {0}")]
    MissingKey(&'static str),

    #[error("Invalid value for {key} at line {line}: {value}")]
    InvalidValue {
        key: &'static str,
        line: usize,
        value: String,
    },

    #[error("Invalid resolution {0:?}: every axis must be non-zero")]
    InvalidResolution([usize; 3]),

    #[error("Invalid slice thickness {0:?}: every axis must be finite and positive")]
    InvalidThickness([f32; 3]),

    #[error("Voxel data too short: expected {expected} bytes, got {actual}")]
    DataSize { expected: usize, actual: usize },
}

/// Result type for volume loading.
pub type VolumeResult<T> = Result<T, VolumeError>;

/// Parsed `.dat` metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMetadata {
    /// Voxel count along each axis
    pub resolution: [usize; 3],
    /// Physical size of one voxel along each axis
    pub thickness: Vec3,
}

impl VolumeMetadata {
    /// Number of voxels in the grid.
    pub fn voxel_count(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Parse metadata from the contents of a `.dat` file.
    pub fn parse(content: &str) -> VolumeResult<Self> {
        let mut resolution = None;
        let mut thickness = None;

        for (index, line) in content.lines().enumerate() {
            let line_num = index + 1;
            let mut fields = line
                .split(|c: char| c == ':' || c == '\t' || c == ' ')
                .filter(|f| !f.is_empty());

            match fields.next() {
                Some("Resolution") => {
                    let values = parse_triple::<usize>(fields, "Resolution", line_num)?;
                    resolution = Some(values);
                }
                Some("SliceThickness") => {
                    let values = parse_triple::<f32>(fields, "SliceThickness", line_num)?;
                    thickness = Some(values);
                }
                _ => {}
            }
        }

        let resolution = resolution.ok_or(VolumeError::MissingKey("Resolution"))?;
        let thickness = thickness.ok_or(VolumeError::MissingKey("SliceThickness"))?;

        if resolution.contains(&0) {
            return Err(VolumeError::InvalidResolution(resolution));
        }
        if thickness.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(VolumeError::InvalidThickness(thickness));
        }

        Ok(Self {
            resolution,
            thickness: Vec3::from_array(thickness),
        })
    }
}

fn parse_triple<'a, T: std::str::FromStr + Copy + Default>(
    mut fields: impl Iterator<Item = &'a str>,
    key: &'static str,
    line: usize,
) -> VolumeResult<[T; 3]> {
    let mut values = [T::default(); 3];
    for value in values.iter_mut() {
        let field = fields.next().ok_or_else(|| VolumeError::InvalidValue {
            key,
            line,
            value: "<missing>".to_string(),
        })?;
        *value = field.parse().map_err(|_| VolumeError::InvalidValue {
            key,
            line,
            value: field.to_string(),
        })?;
    }
    Ok(values)
}

/// A dense grid of 8-bit voxel intensities.
///
/// Voxels are stored x-fastest: `data[z * ry * rx + y * rx + x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    resolution: [usize; 3],
    thickness: Vec3,
    data: Vec<u8>,
}

impl VoxelGrid {
    /// Create a grid from metadata and voxel bytes.
    ///
    /// Fails if `data` holds fewer bytes than the resolution requires. Extra
    /// trailing bytes are dropped.
    pub fn new(metadata: VolumeMetadata, mut data: Vec<u8>) -> VolumeResult<Self> {
        let expected = metadata.voxel_count();
        if data.len() < expected {
            return Err(VolumeError::DataSize {
                expected,
                actual: data.len(),
            });
        }
        if data.len() > expected {
            log::warn!(
                "Voxel data has {} trailing bytes, ignoring them",
                data.len() - expected
            );
            data.truncate(expected);
        }

        Ok(Self {
            resolution: metadata.resolution,
            thickness: metadata.thickness,
            data,
        })
    }

    /// Create a grid where every voxel has the given intensity.
    pub fn filled(resolution: [usize; 3], thickness: Vec3, value: u8) -> Self {
        let count = resolution.iter().product();
        Self {
            resolution,
            thickness,
            data: vec![value; count],
        }
    }

    /// Create a grid from a function of the voxel coordinates.
    pub fn from_fn(
        resolution: [usize; 3],
        thickness: Vec3,
        f: impl Fn(usize, usize, usize) -> u8,
    ) -> Self {
        let [rx, ry, rz] = resolution;
        let mut data = Vec::with_capacity(rx * ry * rz);
        for z in 0..rz {
            for y in 0..ry {
                for x in 0..rx {
                    data.push(f(x, y, z));
                }
            }
        }
        Self {
            resolution,
            thickness,
            data,
        }
    }

    /// Load a grid from a `.dat` metadata file and a `.raw` voxel file.
    pub fn load(dat_path: impl AsRef<Path>, raw_path: impl AsRef<Path>) -> VolumeResult<Self> {
        let dat_path = dat_path.as_ref();
        let raw_path = raw_path.as_ref();

        let metadata = VolumeMetadata::parse(&fs::read_to_string(dat_path)?)?;
        let data = fs::read(raw_path)?;

        log::debug!(
            "Loaded volume {}: {}x{}x{} voxels, thickness {:?}",
            raw_path.display(),
            metadata.resolution[0],
            metadata.resolution[1],
            metadata.resolution[2],
            metadata.thickness
        );

        Self::new(metadata, data)
    }

    /// Voxel count along each axis.
    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Physical size of one voxel along each axis.
    pub fn thickness(&self) -> Vec3 {
        self.thickness
    }

    /// Physical extent of the whole grid (before any scene scale).
    pub fn extent(&self) -> Vec3 {
        Vec3::new(
            self.resolution[0] as f32,
            self.resolution[1] as f32,
            self.resolution[2] as f32,
        ) * self.thickness
    }

    /// Intensity at signed voxel coordinates, 0 outside the grid.
    pub fn value(&self, x: i32, y: i32, z: i32) -> u8 {
        let [rx, ry, rz] = self.resolution;
        if x < 0 || y < 0 || z < 0 {
            return 0;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= rx || y >= ry || z >= rz {
            return 0;
        }
        self.data[z * ry * rx + y * rx + x]
    }

    /// Raw voxel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const DAT: &str = "ObjectFileName: vol.raw\nResolution:\t4 3 2\nSliceThickness: 0.5 0.5 2.0\nFormat: UCHAR\n";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("voxray_volume_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_metadata() {
        let meta = VolumeMetadata::parse(DAT).unwrap();

        assert_eq!(meta.resolution, [4, 3, 2]);
        assert_eq!(meta.thickness, Vec3::new(0.5, 0.5, 2.0));
        assert_eq!(meta.voxel_count(), 24);
    }

    #[test]
    fn test_parse_metadata_missing_key() {
        let err = VolumeMetadata::parse("Resolution: 1 1 1\n").unwrap_err();
        assert!(matches!(err, VolumeError::MissingKey("SliceThickness")));
    }

    #[test]
    fn test_parse_metadata_bad_number() {
        let err = VolumeMetadata::parse("Resolution: 1 x 1\nSliceThickness: 1 1 1\n").unwrap_err();
        match err {
            VolumeError::InvalidValue { key, line, value } => {
                assert_eq!(key, "Resolution");
                assert_eq!(line, 1);
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_metadata_short_line() {
        let err = VolumeMetadata::parse("Resolution: 1 1\nSliceThickness: 1 1 1\n").unwrap_err();
        assert!(matches!(err, VolumeError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_metadata_rejects_degenerate_grid() {
        let err = VolumeMetadata::parse("Resolution: 0 4 4\nSliceThickness: 1 1 1\n").unwrap_err();
        assert!(matches!(err, VolumeError::InvalidResolution(_)));

        let err = VolumeMetadata::parse("Resolution: 4 4 4\nSliceThickness: 1 0 1\n").unwrap_err();
        assert!(matches!(err, VolumeError::InvalidThickness(_)));
    }

    #[test]
    fn test_grid_value_layout_and_bounds() {
        let grid = VoxelGrid::from_fn([4, 3, 2], Vec3::ONE, |x, y, z| (x + 10 * y + 100 * z) as u8);

        assert_eq!(grid.value(0, 0, 0), 0);
        assert_eq!(grid.value(3, 2, 1), 123);
        assert_eq!(grid.data()[12 + 8 + 3], 123);

        // Outside the grid reads as empty
        assert_eq!(grid.value(-1, 0, 0), 0);
        assert_eq!(grid.value(4, 0, 0), 0);
        assert_eq!(grid.value(0, 3, 0), 0);
        assert_eq!(grid.value(0, 0, 2), 0);
    }

    #[test]
    fn test_grid_extent() {
        let grid = VoxelGrid::filled([4, 3, 2], Vec3::new(0.5, 0.5, 2.0), 1);
        assert_eq!(grid.extent(), Vec3::new(2.0, 1.5, 4.0));
    }

    #[test]
    fn test_grid_data_too_short() {
        let meta = VolumeMetadata::parse(DAT).unwrap();
        let err = VoxelGrid::new(meta, vec![0; 10]).unwrap_err();

        assert!(matches!(
            err,
            VolumeError::DataSize {
                expected: 24,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_grid_trailing_bytes_dropped() {
        let meta = VolumeMetadata::parse(DAT).unwrap();
        let grid = VoxelGrid::new(meta, vec![7; 30]).unwrap();

        assert_eq!(grid.data().len(), 24);
    }

    #[test]
    fn test_load_from_files() {
        let dir = scratch_dir("load");
        let dat = dir.join("vol.dat");
        let raw = dir.join("vol.raw");
        fs::write(&dat, DAT).unwrap();
        fs::write(&raw, (0..24u8).collect::<Vec<_>>()).unwrap();

        let grid = VoxelGrid::load(&dat, &raw).unwrap();
        assert_eq!(grid.resolution(), [4, 3, 2]);
        assert_eq!(grid.value(1, 1, 1), 12 + 4 + 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let dir = scratch_dir("missing");
        let err = VoxelGrid::load(dir.join("nope.dat"), dir.join("nope.raw")).unwrap_err();

        assert!(matches!(err, VolumeError::Io(_)));
        fs::remove_dir_all(&dir).ok();
    }
}
