//! Per-feature metadata: feature tables, feature layers and the statistics
//! a tileset advertises for them

pub mod feature;
pub mod statistics;

pub use feature::{
    FeatureIdSource, FeatureLayer, FeatureTable, PropertyValues, add_feature_layer, add_feature_table,
    feature_tables, mark_feature_metadata_used,
};
pub use statistics::{PropertyRange, derive_statistics};
