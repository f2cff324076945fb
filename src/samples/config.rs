//! Sample generation settings

use std::path::{Path, PathBuf};

use crate::core::{Error, Result};
use crate::instancing::checked_count;

/// Serialization of tile content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFormat {
    /// Binary container (`.glb`)
    Glb,
    /// Plain JSON (`.gltf`)
    #[default]
    Gltf,
}

impl ContentFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ContentFormat::Glb => ".glb",
            ContentFormat::Gltf => ".gltf",
        }
    }

    /// Content file name for a tile stem, e.g. `tree` -> `tree.glb`
    pub fn file_name(self, stem: &str) -> String {
        format!("{}{}", stem, self.extension())
    }
}

/// How descriptors and assets are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// Indent JSON output
    pub pretty_print: bool,
    /// Gzip every written file (names are kept)
    pub compress: bool,
    /// Embed `.gltf` buffers as data URIs instead of sidecar `.bin` files
    pub embed_binary_inline: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            pretty_print: false,
            compress: false,
            embed_binary_inline: true,
        }
    }
}

/// Everything a sample routine needs from its surroundings
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    /// Tile origin longitude in degrees
    pub longitude_deg: f64,
    /// Tile origin latitude in degrees
    pub latitude_deg: f64,
    /// Width of a tile footprint in meters
    pub tile_width: f64,
    /// Instances per model in instanced samples; signed as it arrives from
    /// the command line
    pub instance_count: i64,
    /// `asset.version` written into every tileset
    pub version: String,
    pub format: ContentFormat,
    /// Directory holding the source meshes
    pub data_dir: PathBuf,
    /// Root of the generated tree; samples land in `<output_dir>/Samples/<name>`
    pub output_dir: PathBuf,
    pub output: OutputOptions,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            longitude_deg: (-1.31968_f64).to_degrees(),
            latitude_deg: 0.698874_f64.to_degrees(),
            tile_width: 200.0,
            instance_count: 25,
            version: "1.0".to_string(),
            format: ContentFormat::default(),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            output: OutputOptions::default(),
        }
    }
}

impl SampleConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.longitude_deg.is_finite() || !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(Error::invalid(format!(
                "origin ({}, {}) is not a valid geodetic position",
                self.longitude_deg, self.latitude_deg
            )));
        }
        if !self.tile_width.is_finite() || self.tile_width <= 0.0 {
            return Err(Error::invalid(format!("tile width must be positive, got {}", self.tile_width)));
        }
        if self.version.is_empty() {
            return Err(Error::invalid("tileset version is empty"));
        }
        self.instances()?;
        Ok(())
    }

    /// Instance count per model, rejecting negative counts
    pub fn instances(&self) -> Result<usize> {
        checked_count(self.instance_count)
    }

    /// Path of a source mesh, e.g. `data/tree.glb`
    pub fn source_path(&self, stem: &str) -> PathBuf {
        self.data_dir.join(format!("{}.glb", stem))
    }

    /// Output directory of one sample
    pub fn sample_dir(&self, sample_name: &str) -> PathBuf {
        self.output_dir.join("Samples").join(sample_name)
    }

    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SampleConfig::default();
        assert!((config.longitude_deg.to_radians() - -1.31968).abs() < 1e-12);
        assert!((config.latitude_deg.to_radians() - 0.698874).abs() < 1e-12);
        assert_eq!(config.tile_width, 200.0);
        assert_eq!(config.version, "1.0");
        assert_eq!(config.instances().unwrap(), 25);
        config.validate().unwrap();
    }

    #[test]
    fn test_negative_instance_count_rejected() {
        let config = SampleConfig { instance_count: -3, ..SampleConfig::default() };
        assert!(matches!(config.instances(), Err(Error::InvalidArgument(_))));
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));

        let empty = SampleConfig { instance_count: 0, ..SampleConfig::default() };
        assert_eq!(empty.instances().unwrap(), 0);
    }

    #[test]
    fn test_paths() {
        let config = SampleConfig::default().with_output_dir("out").with_data_dir("meshes");
        assert_eq!(config.source_path("tree"), PathBuf::from("meshes/tree.glb"));
        assert_eq!(
            config.sample_dir("TilesetWithTreeBillboards"),
            PathBuf::from("out/Samples/TilesetWithTreeBillboards")
        );
        assert_eq!(ContentFormat::Glb.file_name("tree"), "tree.glb");
        assert_eq!(ContentFormat::Gltf.file_name("tree"), "tree.gltf");
    }

    #[test]
    fn test_invalid_config() {
        let mut config = SampleConfig::default();
        config.tile_width = -5.0;
        assert!(config.validate().is_err());

        let config = SampleConfig { latitude_deg: 120.0, ..SampleConfig::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }
}
