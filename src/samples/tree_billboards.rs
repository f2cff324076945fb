//! `TilesetWithTreeBillboards`: a grove of instanced trees, replaced by
//! instanced billboards from far away.
//!
//! Both meshes get the same treatment: instance positions appended to the
//! buffer, the GPU instancing extension on the mesh node, and a per-instance
//! `Height` feature table bound through an implicit feature layer.
//!
//! Translations are local to a ground-level east-north-up frame, which the
//! root tile carries as its transform.

use crate::core::{Error, Result};
use crate::geo::{Frame, build_frame, tile_region};
use crate::gltf::{Gltf, append_buffer};
use crate::instancing::{InstancingBindings, ModelAnchor, attach_instancing, generate_positions};
use crate::metadata::{
    FeatureLayer, FeatureTable, add_feature_layer, add_feature_table, derive_statistics, feature_tables,
    mark_feature_metadata_used,
};
use crate::tileset::{BoundingVolume, CONTENT_GLTF_EXTENSION, InstancedLevel, TilesetAsset, build_instanced_pair};
use super::config::SampleConfig;
use super::{SampleOutput, TileAsset};

pub const NAME: &str = "TilesetWithTreeBillboards";

/// Source meshes: the full tree, then its billboard
pub const SOURCES: [&str; 2] = ["tree", "tree_billboard"];

const TREE_HEIGHT: f64 = 20.0;
const TREE_ERROR: f64 = 10.0;
const BILLBOARD_ERROR: f64 = 100.0;
const HEIGHT_PROPERTY: &str = "Height";

/// Instance `count` copies of the asset's first mesh node across the tile
/// and describe them with a feature table.
///
/// Positions are placed in `frame` and written relative to `tile_frame`.
fn instance_model(
    gltf: &mut Gltf,
    config: &SampleConfig,
    count: usize,
    anchor: ModelAnchor,
    frame: &Frame,
    tile_frame: &Frame,
) -> Result<()> {
    let (node, mesh) = gltf
        .nodes
        .iter()
        .enumerate()
        .find_map(|(i, n)| n.mesh.map(|m| (i, m)))
        .ok_or_else(|| Error::invalid("asset has no mesh node to instance"))?;

    let positions =
        generate_positions(count, config.tile_width, TREE_HEIGHT, anchor, frame)?.rebase(frame, tile_frame);
    let accessor = append_buffer(gltf, &positions.gltf_translations())?;
    attach_instancing(gltf, node, &InstancingBindings::translation(accessor), false)?;

    mark_feature_metadata_used(gltf);
    let table = FeatureTable::new(positions.len()).with_property(HEIGHT_PROPERTY, vec![TREE_HEIGHT; positions.len()])?;
    let table_index = add_feature_table(gltf, &table)?;
    add_feature_layer(gltf, mesh, 0, &FeatureLayer::per_instance(table_index))?;

    gltf.validate()
}

/// Build the sample from the decoded `SOURCES`, in order
pub fn generate(config: &SampleConfig, assets: Vec<Gltf>) -> Result<SampleOutput> {
    let [mut tree, mut billboard]: [Gltf; 2] = assets.try_into().map_err(|assets: Vec<Gltf>| {
        Error::invalid(format!("{} needs {} source meshes, got {}", NAME, SOURCES.len(), assets.len()))
    })?;
    let count = config.instances()?;
    if count == 0 {
        return Err(Error::invalid(format!("{} needs at least one instance", NAME)));
    }

    let (lon, lat) = (config.longitude_deg, config.latitude_deg);
    let region = BoundingVolume::region(tile_region(lon, lat, config.tile_width, 0.0, TREE_HEIGHT)?)?;

    // the billboard is centered on its origin, so its frame sits at mid-height
    let ground = build_frame(lon, lat, 0.0)?;
    let billboard_frame = build_frame(lon, lat, TREE_HEIGHT / 2.0)?;

    instance_model(&mut tree, config, count, ModelAnchor::Base, &ground, &ground)?;
    instance_model(&mut billboard, config, count, ModelAnchor::Center, &billboard_frame, &ground)?;

    // statistics describe the tables as written
    let mut written = feature_tables(&tree)?;
    written.extend(feature_tables(&billboard)?);
    let merged = FeatureTable::concat(&written)?;
    let statistics = derive_statistics(&merged.property_arrays())?;

    let tree_name = config.format.file_name(SOURCES[0]);
    let billboard_name = config.format.file_name(SOURCES[1]);
    let near = InstancedLevel {
        bounding_volume: region,
        geometric_error: TREE_ERROR,
        content_uri: tree_name.clone(),
        transform: Some(ground),
    };
    let far = InstancedLevel {
        bounding_volume: region,
        geometric_error: BILLBOARD_ERROR,
        content_uri: billboard_name.clone(),
        transform: Some(ground),
    };
    let mut descriptor = build_instanced_pair(TilesetAsset::new(config.version.clone()), &near, &far, statistics)?;
    if config.version == "1.0" {
        descriptor.use_extension(CONTENT_GLTF_EXTENSION, true);
    }

    log::info!("{}: {} instances over {} m", NAME, merged.feature_count(), config.tile_width);

    Ok(SampleOutput {
        name: NAME,
        descriptor: descriptor.with_name(NAME),
        assets: vec![
            TileAsset { file_name: tree_name, gltf: tree },
            TileAsset { file_name: billboard_name, gltf: billboard },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DMat4, DVec3};
    use crate::geo::Ellipsoid;
    use crate::gltf::ExtensionId;
    use crate::gltf::fixtures::triangle;

    fn translation_accessor(gltf: &Gltf) -> usize {
        gltf.nodes[0].extensions["EXT_mesh_gpu_instancing"]["attributes"]["TRANSLATION"]
            .as_u64()
            .unwrap() as usize
    }

    fn bounds(gltf: &Gltf) -> (Vec<f64>, Vec<f64>) {
        let accessor = &gltf.accessors[translation_accessor(gltf)];
        (accessor.min.clone().unwrap(), accessor.max.clone().unwrap())
    }

    #[test]
    fn test_tree_billboard_sample() {
        let config = SampleConfig::default();
        let output = generate(&config, vec![triangle(), triangle()]).unwrap();

        let tileset = &output.descriptor;
        assert_eq!(tileset.geometric_error(), 100.0);
        assert_eq!(tileset.root().geometric_error(), 10.0);
        assert_eq!(tileset.content_uris(), vec!["tree_billboard.gltf", "tree.gltf"]);
        assert!(matches!(tileset.root().bounding_volume(), BoundingVolume::Region(r) if r[5] == 20.0));
        assert_eq!(tileset.name(), Some(NAME));
        assert!(tileset.extensions_required().contains_name(CONTENT_GLTF_EXTENSION));

        let height = tileset.properties()["Height"];
        assert_eq!((height.minimum, height.maximum), (20.0, 20.0));

        for asset in &output.assets {
            let gltf = &asset.gltf;
            assert!(gltf.extensions_used.contains(ExtensionId::MeshGpuInstancing));
            assert!(gltf.extensions_used.contains(ExtensionId::FeatureMetadata));

            let tables = feature_tables(gltf).unwrap();
            assert_eq!(tables.len(), 1);
            assert_eq!(tables[0].feature_count(), 25);
            assert_eq!(gltf.accessors[translation_accessor(gltf)].count, 25);
        }
    }

    #[test]
    fn test_merged_heights() {
        let output = generate(&SampleConfig::default(), vec![triangle(), triangle()]).unwrap();
        let tables: Vec<FeatureTable> = output
            .assets
            .iter()
            .flat_map(|a| feature_tables(&a.gltf).unwrap())
            .collect();

        let merged = FeatureTable::concat(&tables).unwrap();
        assert_eq!(merged.feature_count(), 50);
        let heights = merged.property("Height").unwrap();
        assert_eq!(heights.len(), 50);
        assert!(heights.iter().all(|h| *h == 20.0));
    }

    #[test]
    fn test_instances_stay_in_footprint() {
        let config = SampleConfig { tile_width: 20.0, ..SampleConfig::default() };
        let output = generate(&config, vec![triangle(), triangle()]).unwrap();

        // glTF axes: x east, y up, z south
        let (min, max) = bounds(&output.assets[0].gltf);
        assert!(min[0] >= -10.0 && min[2] >= -10.0);
        assert!(max[0] <= 10.0 && max[2] <= 10.0);
    }

    #[test]
    fn test_root_carries_ground_frame() {
        let config = SampleConfig::default();
        let output = generate(&config, vec![triangle(), triangle()]).unwrap();

        let ground = build_frame(config.longitude_deg, config.latitude_deg, 0.0).unwrap();
        assert_eq!(output.descriptor.root().transform(), Some(&ground.to_cols_array()));
        assert!(output.descriptor.root().children()[0].transform().is_none());
    }

    #[test]
    fn test_billboards_clear_the_ground() {
        let config = SampleConfig::default();
        let output = generate(&config, vec![triangle(), triangle()]).unwrap();
        let root = DMat4::from_cols_array(output.descriptor.root().transform().unwrap());
        let (lon, lat) = (config.longitude_deg.to_radians(), config.latitude_deg.to_radians());
        let ground_origin = Ellipsoid::WGS84.cartographic_to_cartesian(lon, lat, 0.0);
        let up = Ellipsoid::WGS84.geodetic_surface_normal(lon, lat);

        // trees stand on the ground, billboard centers sit at half height
        let (tree_min, _) = bounds(&output.assets[0].gltf);
        let (billboard_min, billboard_max) = bounds(&output.assets[1].gltf);
        assert!(tree_min[1].abs() < 1e-3);
        assert!((billboard_min[1] - TREE_HEIGHT / 2.0).abs() < 1e-3);
        assert!((billboard_max[1] - TREE_HEIGHT / 2.0).abs() < 1e-3);

        // through the y-up rotation and the tile transform, a billboard
        // center lands half its height above the ellipsoid, so its lowest
        // point touches the ground and nothing dips below
        let center = DVec3::new(billboard_min[0], -billboard_min[2], billboard_min[1]);
        let height = (root.transform_point3(center) - ground_origin).dot(up);
        assert!((height - TREE_HEIGHT / 2.0).abs() < 1e-2, "billboard center at {} m", height);
    }

    #[test]
    fn test_instance_count_from_config() {
        let config = SampleConfig { instance_count: 9, ..SampleConfig::default() };
        let output = generate(&config, vec![triangle(), triangle()]).unwrap();
        assert_eq!(feature_tables(&output.assets[0].gltf).unwrap()[0].feature_count(), 9);

        let negative = SampleConfig { instance_count: -1, ..SampleConfig::default() };
        assert!(matches!(generate(&negative, vec![triangle(), triangle()]), Err(Error::InvalidArgument(_))));

        let none = SampleConfig { instance_count: 0, ..SampleConfig::default() };
        assert!(matches!(generate(&none, vec![triangle(), triangle()]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_asset_without_mesh_rejected() {
        let mut bare = triangle();
        bare.nodes[0].mesh = None;
        let result = generate(&SampleConfig::default(), vec![triangle(), bare]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
