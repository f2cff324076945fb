//! `EXT_feature_metadata` tables and layers
//!
//! Tables live in the asset's root extension object:
//!
//! ```json
//! { "featureTables": [ { "featureCount": 25, "properties": { "Height": { "values": [20.0, ...] } } } ] }
//! ```
//!
//! Layers live on a primitive and point at a table by index, deriving each
//! vertex's (or instance's) feature id from a vertex attribute or an
//! implicit `start + increment * i` sequence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::{Error, Result};
use crate::gltf::{ExtensionId, Gltf};

const TABLES_KEY: &str = "featureTables";
const LAYERS_KEY: &str = "featureLayers";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValues {
    pub values: Vec<f64>,
}

/// Per-feature property arrays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTable {
    feature_count: usize,
    #[serde(default)]
    properties: BTreeMap<String, PropertyValues>,
}

impl FeatureTable {
    pub fn new(feature_count: usize) -> Self {
        Self { feature_count, properties: BTreeMap::new() }
    }

    /// Add a property; its array must hold exactly one value per feature
    pub fn with_property(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.feature_count {
            return Err(Error::invalid(format!(
                "property {} has {} values for {} features",
                name,
                values.len(),
                self.feature_count
            )));
        }
        self.properties.insert(name, PropertyValues { values });
        Ok(self)
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn property(&self, name: &str) -> Option<&[f64]> {
        self.properties.get(name).map(|p| p.values.as_slice())
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.values.as_slice()))
    }

    /// Property arrays keyed by name, as statistics are derived from them
    pub fn property_arrays(&self) -> BTreeMap<String, Vec<f64>> {
        self.properties.iter().map(|(k, v)| (k.clone(), v.values.clone())).collect()
    }

    /// Merge tables describing the same kind of feature, e.g. a tree and its
    /// billboard. Feature counts add up and each property's arrays are
    /// concatenated in table order, so every table must carry the same
    /// property names.
    pub fn concat<'a>(tables: impl IntoIterator<Item = &'a FeatureTable>) -> Result<FeatureTable> {
        let mut tables = tables.into_iter();
        let Some(first) = tables.next() else {
            return Ok(FeatureTable::new(0));
        };
        let mut merged = first.clone();
        for table in tables {
            if !table.properties.keys().eq(merged.properties.keys()) {
                return Err(Error::invalid(format!(
                    "cannot merge feature tables with properties {:?} and {:?}",
                    merged.properties.keys().collect::<Vec<_>>(),
                    table.properties.keys().collect::<Vec<_>>()
                )));
            }
            for (name, values) in &table.properties {
                if let Some(target) = merged.properties.get_mut(name) {
                    target.values.extend_from_slice(&values.values);
                }
            }
            merged.feature_count += table.feature_count;
        }
        merged.validate()?;
        Ok(merged)
    }

    fn validate(&self) -> Result<()> {
        for (name, values) in self.properties() {
            if values.len() != self.feature_count {
                return Err(Error::invalid(format!(
                    "property {} has {} values for {} features",
                    name,
                    values.len(),
                    self.feature_count
                )));
            }
        }
        Ok(())
    }
}

/// How a layer derives feature ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureIdSource {
    /// `start + increment * i` for vertex (or instance) `i`
    Implicit { start: u64, increment: u64 },
    /// Ids read from a named vertex attribute
    Attribute(String),
}

/// Binding of a primitive to one feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureLayer {
    pub feature_table: usize,
    /// Feature-id step between consecutive instances
    pub instance_stride: u64,
    pub vertex_attribute: FeatureIdSource,
}

impl FeatureLayer {
    /// One feature per instance: ids 0, 1, 2, ...
    pub fn per_instance(feature_table: usize) -> Self {
        Self {
            feature_table,
            instance_stride: 1,
            vertex_attribute: FeatureIdSource::Implicit { start: 0, increment: 1 },
        }
    }
}

/// Register the feature metadata extension in `extensionsUsed`
pub fn mark_feature_metadata_used(gltf: &mut Gltf) {
    gltf.use_extension(ExtensionId::FeatureMetadata, false);
}

fn tables_value(gltf: &Gltf) -> Option<&Vec<Value>> {
    gltf.extensions
        .get(ExtensionId::FeatureMetadata.name())
        .and_then(|ext| ext.get(TABLES_KEY))
        .and_then(Value::as_array)
}

/// Decode the asset's feature tables, in index order
pub fn feature_tables(gltf: &Gltf) -> Result<Vec<FeatureTable>> {
    let Some(tables) = tables_value(gltf) else {
        return Ok(Vec::new());
    };
    tables
        .iter()
        .map(|t| -> Result<FeatureTable> {
            let table: FeatureTable = serde_json::from_value(t.clone())?;
            table.validate()?;
            Ok(table)
        })
        .collect()
}

/// Append a feature table and return its index
pub fn add_feature_table(gltf: &mut Gltf, table: &FeatureTable) -> Result<usize> {
    table.validate()?;
    let payload = serde_json::to_value(table)?;

    let root = gltf
        .extensions
        .entry(ExtensionId::FeatureMetadata.name())
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| Error::invalid(format!("root {} payload is not an object", ExtensionId::FeatureMetadata)))?;
    let tables = root
        .entry(TABLES_KEY)
        .or_insert_with(|| json!([]))
        .as_array_mut()
        .ok_or_else(|| Error::invalid(format!("{} is not an array", TABLES_KEY)))?;

    tables.push(payload);
    let index = tables.len() - 1;
    log::debug!("Added feature table {} ({} features)", index, table.feature_count());
    Ok(index)
}

/// Bind a primitive to a feature table.
///
/// The table must already exist, and a primitive carries at most one layer.
pub fn add_feature_layer(gltf: &mut Gltf, mesh: usize, primitive: usize, layer: &FeatureLayer) -> Result<()> {
    let table_count = tables_value(gltf).map_or(0, Vec::len);
    if layer.feature_table >= table_count {
        return Err(Error::dangling(format!(
            "feature layer references table {} ({} tables)",
            layer.feature_table, table_count
        )));
    }

    let target = gltf.primitive_mut(mesh, primitive)?;
    if let FeatureIdSource::Attribute(name) = &layer.vertex_attribute {
        if !target.attributes.contains_key(name) {
            return Err(Error::dangling(format!(
                "mesh {} primitive {} has no attribute {}",
                mesh, primitive, name
            )));
        }
    }

    let existing = target
        .extensions
        .get(ExtensionId::FeatureMetadata.name())
        .and_then(|ext| ext.get(LAYERS_KEY))
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if existing > 0 {
        return Err(Error::invalid(format!(
            "mesh {} primitive {} already has a feature layer",
            mesh, primitive
        )));
    }

    let payload = serde_json::to_value(layer)?;
    target
        .extensions
        .insert(ExtensionId::FeatureMetadata.name().to_string(), json!({ "featureLayers": [payload] }));
    log::debug!("Bound mesh {} primitive {} to feature table {}", mesh, primitive, layer.feature_table);
    Ok(())
}
