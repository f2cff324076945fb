//! Min/max statistics for a tileset's `properties` block

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl PropertyRange {
    pub fn contains(&self, value: f64) -> bool {
        self.minimum <= value && value <= self.maximum
    }
}

/// Compute `{minimum, maximum}` for every named property array.
///
/// Each array is treated as the complete set of values for that property.
/// When several feature tables contribute the same property (a tree and its
/// billboard, say), the caller must merge them first, e.g. with
/// [`FeatureTable::concat`]; tables are never merged here.
pub fn derive_statistics(properties: &BTreeMap<String, Vec<f64>>) -> Result<BTreeMap<String, PropertyRange>> {
    let mut stats = BTreeMap::new();
    for (name, values) in properties {
        if values.is_empty() {
            return Err(Error::invalid(format!("property {} has no values", name)));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(Error::invalid(format!("property {} holds non-finite value {}", name, bad)));
        }
        let range = values.iter().fold(
            PropertyRange { minimum: f64::INFINITY, maximum: f64::NEG_INFINITY },
            |r, &v| PropertyRange { minimum: r.minimum.min(v), maximum: r.maximum.max(v) },
        );
        stats.insert(name.clone(), range);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FeatureTable;

    #[test]
    fn test_min_max() {
        let props = BTreeMap::from([
            ("Height".to_string(), vec![3.0, -1.5, 7.25, 0.0]),
            ("Width".to_string(), vec![2.0]),
        ]);
        let stats = derive_statistics(&props).unwrap();

        assert_eq!(stats["Height"], PropertyRange { minimum: -1.5, maximum: 7.25 });
        assert_eq!(stats["Width"], PropertyRange { minimum: 2.0, maximum: 2.0 });
        for v in &props["Height"] {
            assert!(stats["Height"].contains(*v));
        }
    }

    #[test]
    fn test_empty_array_rejected() {
        let props = BTreeMap::from([("Height".to_string(), Vec::new())]);
        assert!(matches!(derive_statistics(&props), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let props = BTreeMap::from([("Height".to_string(), vec![1.0, f64::NAN])]);
        assert!(matches!(derive_statistics(&props), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_merged_tree_and_billboard_heights() {
        let tree = FeatureTable::new(25).with_property("Height", vec![20.0; 25]).unwrap();
        let billboard = FeatureTable::new(25).with_property("Height", vec![20.0; 25]).unwrap();

        let merged = FeatureTable::concat([&tree, &billboard]).unwrap();
        assert_eq!(merged.feature_count(), 50);

        let stats = derive_statistics(&merged.property_arrays()).unwrap();
        assert_eq!(stats["Height"], PropertyRange { minimum: 20.0, maximum: 20.0 });
    }

    #[test]
    fn test_serialized_shape() {
        let range = PropertyRange { minimum: 1.0, maximum: 2.0 };
        assert_eq!(serde_json::to_value(range).unwrap(), serde_json::json!({ "minimum": 1.0, "maximum": 2.0 }));
    }
}
