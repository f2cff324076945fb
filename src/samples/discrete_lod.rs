//! `TilesetWithDiscreteLOD`: three resolutions of the Stanford dragon, each
//! refining into the next.

use crate::core::{Error, Result};
use crate::geo::{build_frame, compose_scale};
use crate::gltf::Gltf;
use crate::tileset::{BoundingVolume, CONTENT_GLTF_EXTENSION, LodLevel, TilesetAsset, build_discrete_lod_chain};
use super::config::SampleConfig;
use super::{SampleOutput, TileAsset};

pub const NAME: &str = "TilesetWithDiscreteLOD";

/// Source meshes, coarsest first
pub const SOURCES: [&str; 3] = ["dragon_low", "dragon_medium", "dragon_high"];

const DRAGON_WIDTH: f64 = 14.191;
const DRAGON_DEPTH: f64 = 6.281;
const DRAGON_HEIGHT: f64 = 10.075;
const DRAGON_SCALE: f64 = 100.0;

/// Content error of each source, coarsest first
const LEVEL_ERRORS: [f64; 3] = [5.0, 1.0, 0.1];

fn dragon_box() -> Result<BoundingVolume> {
    BoundingVolume::oriented_box([
        0.0, 0.0, 0.0,
        DRAGON_WIDTH / 2.0, 0.0, 0.0,
        0.0, DRAGON_DEPTH / 2.0, 0.0,
        0.0, 0.0, DRAGON_HEIGHT / 2.0,
    ])
}

/// Build the sample from the decoded `SOURCES`, in order. The meshes are
/// referenced as-is; the hierarchy carries all of the placement.
pub fn generate(config: &SampleConfig, assets: Vec<Gltf>) -> Result<SampleOutput> {
    if assets.len() != SOURCES.len() {
        return Err(Error::invalid(format!(
            "{} needs {} source meshes, got {}",
            NAME,
            SOURCES.len(),
            assets.len()
        )));
    }

    // lift the frame so the scaled dragon sits on the ellipsoid
    let offset = DRAGON_HEIGHT / 2.0 * DRAGON_SCALE;
    let frame = build_frame(config.longitude_deg, config.latitude_deg, offset)?;
    let frame = compose_scale(&frame, DRAGON_SCALE)?;
    let bounds = dragon_box()?;

    let levels: Vec<LodLevel> = SOURCES
        .iter()
        .zip(LEVEL_ERRORS)
        .enumerate()
        .map(|(i, (stem, error))| LodLevel {
            bounding_volume: bounds,
            geometric_error: error,
            content_uri: config.format.file_name(stem),
            transform: (i == 0).then_some(frame),
        })
        .collect();

    let mut descriptor = build_discrete_lod_chain(TilesetAsset::new(config.version.clone()), &levels)?;
    if config.version == "1.0" {
        descriptor.use_extension(CONTENT_GLTF_EXTENSION, true);
    }

    let assets = SOURCES
        .iter()
        .zip(assets)
        .map(|(stem, gltf)| -> Result<TileAsset> {
            gltf.validate()?;
            Ok(TileAsset { file_name: config.format.file_name(stem), gltf })
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("{}: {} levels, top-level error {}", NAME, levels.len(), descriptor.geometric_error());
    Ok(SampleOutput { name: NAME, descriptor: descriptor.with_name(NAME), assets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::fixtures::triangle;
    use crate::samples::ContentFormat;

    #[test]
    fn test_dragon_sample() {
        let config = SampleConfig { format: ContentFormat::Glb, ..SampleConfig::default() };
        let output = generate(&config, vec![triangle(), triangle(), triangle()]).unwrap();

        let tileset = &output.descriptor;
        assert_eq!(tileset.geometric_error(), 500.0);
        assert_eq!(tileset.asset().version, "1.0");
        assert_eq!(tileset.name(), Some(NAME));
        assert!(tileset.extensions_used().contains_name(CONTENT_GLTF_EXTENSION));
        assert_eq!(tileset.content_uris(), vec!["dragon_low.glb", "dragon_medium.glb", "dragon_high.glb"]);

        let errors: Vec<f64> = tileset.root().walk().iter().map(|n| n.geometric_error()).collect();
        assert_eq!(errors, vec![1.0, 0.1, 0.0]);

        let root = tileset.root();
        assert!((root.transform_scale() - 100.0).abs() < 1e-9);
        assert!(matches!(root.bounding_volume(), BoundingVolume::Box(b) if b[11] == 10.075 / 2.0));

        let names: Vec<_> = output.assets.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, ["dragon_low.glb", "dragon_medium.glb", "dragon_high.glb"]);
    }

    #[test]
    fn test_newer_version_skips_content_extension() {
        let config = SampleConfig { version: "1.1".into(), ..SampleConfig::default() };
        let output = generate(&config, vec![triangle(), triangle(), triangle()]).unwrap();
        assert!(output.descriptor.extensions_used().is_empty());
    }

    #[test]
    fn test_wrong_source_count() {
        let result = generate(&SampleConfig::default(), vec![triangle()]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
