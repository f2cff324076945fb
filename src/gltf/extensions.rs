//! Extension identifiers and registries
//!
//! Extension names are kept as enum values while the document is mutated and
//! turned into their wire strings only when serialized. Names this crate does
//! not know about are preserved verbatim.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// glTF extensions this generator writes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionId {
    /// Per-instance node transforms (`EXT_mesh_gpu_instancing`)
    MeshGpuInstancing,
    /// Feature tables and layers (`EXT_feature_metadata`)
    FeatureMetadata,
}

impl ExtensionId {
    pub const ALL: [ExtensionId; 2] = [ExtensionId::MeshGpuInstancing, ExtensionId::FeatureMetadata];

    /// Wire-format extension name
    pub const fn name(self) -> &'static str {
        match self {
            ExtensionId::MeshGpuInstancing => "EXT_mesh_gpu_instancing",
            ExtensionId::FeatureMetadata => "EXT_feature_metadata",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl std::fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of extension names with idempotent insertion.
///
/// Serializes as a sorted array of names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExtensionSet {
    known: BTreeSet<ExtensionId>,
    foreign: BTreeSet<String>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an extension; returns false if it was already present
    pub fn insert(&mut self, id: ExtensionId) -> bool {
        self.known.insert(id)
    }

    /// Insert an extension by wire name
    pub fn insert_name(&mut self, name: &str) -> bool {
        match ExtensionId::from_name(name) {
            Some(id) => self.insert(id),
            None => self.foreign.insert(name.to_string()),
        }
    }

    pub fn contains(&self, id: ExtensionId) -> bool {
        self.known.contains(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        match ExtensionId::from_name(name) {
            Some(id) => self.contains(id),
            None => self.foreign.contains(name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.foreign.is_empty()
    }

    pub fn len(&self) -> usize {
        self.known.len() + self.foreign.len()
    }

    /// All names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = self.foreign.iter().map(String::as_str).collect();
        names.extend(self.known.iter().map(|id| id.name()));
        names.into_iter().map(str::to_string).collect()
    }

    /// Whether every name in `other` is also in `self`
    pub fn is_superset(&self, other: &ExtensionSet) -> bool {
        self.known.is_superset(&other.known) && self.foreign.is_superset(&other.foreign)
    }
}

impl From<Vec<String>> for ExtensionSet {
    fn from(names: Vec<String>) -> Self {
        let mut set = ExtensionSet::new();
        for name in &names {
            set.insert_name(name);
        }
        set
    }
}

impl From<ExtensionSet> for Vec<String> {
    fn from(set: ExtensionSet) -> Self {
        set.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = ExtensionSet::new();
        assert!(set.insert(ExtensionId::FeatureMetadata));
        assert!(!set.insert(ExtensionId::FeatureMetadata));
        assert!(!set.insert_name("EXT_feature_metadata"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_foreign_names_preserved() {
        let set: ExtensionSet = serde_json::from_str(
            r#"["KHR_materials_unlit", "EXT_mesh_gpu_instancing"]"#,
        ).unwrap();

        assert!(set.contains(ExtensionId::MeshGpuInstancing));
        assert!(set.contains_name("KHR_materials_unlit"));
        assert!(!set.contains(ExtensionId::FeatureMetadata));

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["EXT_mesh_gpu_instancing","KHR_materials_unlit"]"#);
    }

    #[test]
    fn test_superset() {
        let mut used = ExtensionSet::new();
        used.insert(ExtensionId::MeshGpuInstancing);
        used.insert_name("KHR_texture_transform");

        let mut required = ExtensionSet::new();
        required.insert(ExtensionId::MeshGpuInstancing);
        assert!(used.is_superset(&required));

        required.insert(ExtensionId::FeatureMetadata);
        assert!(!used.is_superset(&required));
    }

    #[test]
    fn test_names_round_trip() {
        for id in ExtensionId::ALL {
            assert_eq!(ExtensionId::from_name(id.name()), Some(id));
        }
        assert_eq!(ExtensionId::from_name("EXT_unknown"), None);
    }
}
