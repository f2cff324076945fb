//! `tileset.json`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::gltf::ExtensionSet;
use crate::metadata::PropertyRange;
use super::tile::TileNode;

/// Tileset-level extension declaring glTF tile content in a 1.0 tileset
pub const CONTENT_GLTF_EXTENSION: &str = "3DTILES_content_gltf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetAsset {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tileset_version: Option<String>,
}

impl TilesetAsset {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into(), tileset_version: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TilesetExtras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A complete tileset: asset info, top-level geometric error, optional
/// per-property statistics and the root tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetDescriptor {
    asset: TilesetAsset,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, PropertyRange>,
    geometric_error: f64,
    root: TileNode,
    #[serde(default, skip_serializing_if = "ExtensionSet::is_empty")]
    extensions_used: ExtensionSet,
    #[serde(default, skip_serializing_if = "ExtensionSet::is_empty")]
    extensions_required: ExtensionSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extras: Option<TilesetExtras>,
}

impl TilesetDescriptor {
    /// Assemble a tileset around an already-built root.
    ///
    /// The root must declare a refinement policy, and the top-level error
    /// must cover the root's error as the runtime sees it, i.e. scaled by the
    /// root transform.
    pub fn new(asset: TilesetAsset, geometric_error: f64, root: TileNode) -> Result<Self> {
        let descriptor = Self {
            asset,
            properties: BTreeMap::new(),
            geometric_error,
            root,
            extensions_used: ExtensionSet::new(),
            extensions_required: ExtensionSet::new(),
            extras: None,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, PropertyRange>) -> Result<Self> {
        for (name, range) in &properties {
            if !(range.minimum <= range.maximum) {
                return Err(Error::invalid(format!(
                    "property {} range {}..{} is inverted",
                    name, range.minimum, range.maximum
                )));
            }
        }
        self.properties = properties;
        Ok(self)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.extras = Some(TilesetExtras { name: Some(name.into()) });
        self
    }

    /// Register a tileset-level extension by name
    pub fn use_extension(&mut self, name: &str, required: bool) {
        self.extensions_used.insert_name(name);
        if required {
            self.extensions_required.insert_name(name);
        }
    }

    pub fn extensions_used(&self) -> &ExtensionSet {
        &self.extensions_used
    }

    pub fn extensions_required(&self) -> &ExtensionSet {
        &self.extensions_required
    }

    pub fn asset(&self) -> &TilesetAsset {
        &self.asset
    }

    pub fn geometric_error(&self) -> f64 {
        self.geometric_error
    }

    pub fn root(&self) -> &TileNode {
        &self.root
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyRange> {
        &self.properties
    }

    pub fn name(&self) -> Option<&str> {
        self.extras.as_ref().and_then(|e| e.name.as_deref())
    }

    /// Content URIs in pre-order
    pub fn content_uris(&self) -> Vec<&str> {
        self.root.walk().into_iter().filter_map(|n| n.content()).map(|c| c.uri.as_str()).collect()
    }

    /// Check the tileset as this crate authors it.
    ///
    /// Stricter than the format: the top-level error must also cover the
    /// root error scaled by the root transform. The format allows a smaller
    /// value; the builders never produce one.
    pub fn validate(&self) -> Result<()> {
        if self.asset.version.is_empty() {
            return Err(Error::invalid("tileset asset version is empty"));
        }
        if !self.geometric_error.is_finite() || self.geometric_error < 0.0 {
            return Err(Error::invalid(format!(
                "top-level geometric error must be finite and >= 0, got {}",
                self.geometric_error
            )));
        }
        if self.root.refine().is_none() {
            return Err(Error::invalid("root tile must declare a refinement policy"));
        }
        self.root.validate()?;

        let scaled_root = self.root.geometric_error() * self.root.transform_scale();
        if self.geometric_error < scaled_root {
            return Err(Error::topology(format!(
                "top-level geometric error {} is below the root's scaled error {}",
                self.geometric_error, scaled_root
            )));
        }
        if !self.extensions_used.is_superset(&self.extensions_required) {
            return Err(Error::invalid("tileset extensionsRequired not listed in extensionsUsed"));
        }
        Ok(())
    }

    pub fn to_json(&self, pretty: bool) -> Result<Vec<u8>> {
        let json = if pretty {
            serde_json::to_vec_pretty(self)?
        } else {
            serde_json::to_vec(self)?
        };
        Ok(json)
    }

    /// Parse a tileset and run [`validate`](Self::validate), so a tileset
    /// that is well-formed but authored with a top-level error below its
    /// scaled root error is rejected
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let descriptor: TilesetDescriptor = serde_json::from_slice(bytes)?;
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::{BoundingVolume, Refine, TileBuilder};
    use serde_json::{Value, json};

    fn region() -> BoundingVolume {
        BoundingVolume::region([-1.3197, 0.6988, -1.3196, 0.6989, 0.0, 20.0]).unwrap()
    }

    fn pair() -> TileNode {
        let leaf = TileBuilder::new(region(), 0.0).content_uri("tree.glb").build().unwrap();
        TileBuilder::new(region(), 10.0)
            .refine(Refine::Replace)
            .content_uri("tree_billboard.glb")
            .child(leaf)
            .build()
            .unwrap()
    }

    #[test]
    fn test_json_shape() {
        let stats = BTreeMap::from([("Height".to_string(), PropertyRange { minimum: 20.0, maximum: 20.0 })]);
        let descriptor = TilesetDescriptor::new(TilesetAsset::new("1.0"), 100.0, pair())
            .unwrap()
            .with_properties(stats)
            .unwrap();

        let value: Value = serde_json::from_slice(&descriptor.to_json(false).unwrap()).unwrap();
        assert_eq!(value["asset"], json!({ "version": "1.0" }));
        assert_eq!(value["geometricError"], 100.0);
        assert_eq!(value["properties"]["Height"], json!({ "minimum": 20.0, "maximum": 20.0 }));
        assert_eq!(value["root"]["refine"], "REPLACE");
        assert!(value["root"]["boundingVolume"]["region"].is_array());
        assert!(value.get("extensionsUsed").is_none());
        assert_eq!(descriptor.content_uris(), vec!["tree_billboard.glb", "tree.glb"]);
    }

    #[test]
    fn test_round_trip() {
        let descriptor = TilesetDescriptor::new(TilesetAsset::new("1.0"), 100.0, pair())
            .unwrap()
            .with_name("TilesetWithTreeBillboards");
        let back = TilesetDescriptor::from_json(&descriptor.to_json(true).unwrap()).unwrap();
        assert_eq!(back, descriptor);
        assert_eq!(back.name(), Some("TilesetWithTreeBillboards"));
    }

    #[test]
    fn test_top_level_error_covers_scaled_root() {
        let mut t = [0.0; 16];
        t[0] = 100.0;
        t[5] = 100.0;
        t[10] = 100.0;
        t[15] = 1.0;
        let root = TileBuilder::new(region(), 1.0).refine(Refine::Replace).transform(t).build().unwrap();

        assert!(matches!(
            TilesetDescriptor::new(TilesetAsset::new("1.0"), 5.0, root.clone()),
            Err(Error::UnsupportedTopology(_))
        ));
        TilesetDescriptor::new(TilesetAsset::new("1.0"), 500.0, root).unwrap();
    }

    #[test]
    fn test_root_needs_refine() {
        let root = TileBuilder::new(region(), 1.0).build().unwrap();
        assert!(TilesetDescriptor::new(TilesetAsset::new("1.0"), 5.0, root).is_err());
    }

    #[test]
    fn test_from_json_rejects_invalid_tree() {
        let json = json!({
            "asset": { "version": "1.0" },
            "geometricError": 10.0,
            "root": {
                "boundingVolume": { "sphere": [0, 0, 0, 1] },
                "geometricError": 1.0,
                "refine": "REPLACE",
                "children": [
                    { "boundingVolume": { "sphere": [0, 0, 0, 1] }, "geometricError": 5.0 }
                ]
            }
        });
        let result = TilesetDescriptor::from_json(json.to_string().as_bytes());
        assert!(matches!(result, Err(Error::UnsupportedTopology(_))));

        let both = json!({
            "asset": { "version": "1.0" },
            "geometricError": 10.0,
            "root": {
                "boundingVolume": { "sphere": [0, 0, 0, 1], "box": [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1] },
                "geometricError": 1.0,
                "refine": "REPLACE"
            }
        });
        assert!(TilesetDescriptor::from_json(both.to_string().as_bytes()).is_err());
    }

    #[test]
    fn test_from_json_keeps_request_volume() {
        let json = json!({
            "asset": { "version": "1.0" },
            "geometricError": 10.0,
            "root": {
                "boundingVolume": { "sphere": [0, 0, 0, 100] },
                "viewerRequestVolume": { "sphere": [0, 0, 0, 50] },
                "geometricError": 1.0,
                "refine": "REPLACE"
            }
        });
        let descriptor = TilesetDescriptor::from_json(json.to_string().as_bytes()).unwrap();
        assert_eq!(
            descriptor.root().viewer_request_volume(),
            Some(&BoundingVolume::sphere([0.0, 0.0, 0.0, 50.0]).unwrap())
        );

        let value: Value = serde_json::from_slice(&descriptor.to_json(false).unwrap()).unwrap();
        assert_eq!(value["root"]["viewerRequestVolume"]["sphere"], json!([0.0, 0.0, 0.0, 50.0]));
    }

    #[test]
    fn test_extensions_serialized() {
        let mut descriptor = TilesetDescriptor::new(TilesetAsset::new("1.0"), 100.0, pair()).unwrap();
        descriptor.use_extension(CONTENT_GLTF_EXTENSION, true);

        let value: Value = serde_json::from_slice(&descriptor.to_json(false).unwrap()).unwrap();
        assert_eq!(value["extensionsUsed"], json!(["3DTILES_content_gltf"]));
        assert_eq!(value["extensionsRequired"], json!(["3DTILES_content_gltf"]));
        assert_eq!(TilesetDescriptor::from_json(&descriptor.to_json(false).unwrap()).unwrap(), descriptor);
    }
}
