//! Sample tilesets
//!
//! Each sample routine takes already-decoded source meshes (in the order
//! its `SOURCES` lists them), mutates them in place and returns the
//! tileset descriptor with the content files it references. Routines are
//! synchronous and share nothing, so independent samples can run in
//! parallel.

pub mod config;
pub mod discrete_lod;
pub mod tree_billboards;

pub use config::{ContentFormat, OutputOptions, SampleConfig};

use crate::core::Result;
use crate::gltf::Gltf;
use crate::tileset::TilesetDescriptor;

/// The sample topologies this crate generates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    DiscreteLod,
    TreeBillboards,
}

impl SampleKind {
    pub const ALL: [SampleKind; 2] = [SampleKind::DiscreteLod, SampleKind::TreeBillboards];

    /// Output directory name, e.g. `TilesetWithDiscreteLOD`
    pub const fn name(self) -> &'static str {
        match self {
            SampleKind::DiscreteLod => discrete_lod::NAME,
            SampleKind::TreeBillboards => tree_billboards::NAME,
        }
    }

    /// Accepts the full sample name or a short alias (`discrete-lod`,
    /// `tree-billboards`), ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| {
            kind.name().eq_ignore_ascii_case(&lower)
                || match kind {
                    SampleKind::DiscreteLod => lower == "discrete-lod",
                    SampleKind::TreeBillboards => lower == "tree-billboards",
                }
        })
    }

    /// Stems of the source meshes, in the order `generate` expects them
    pub fn sources(self) -> &'static [&'static str] {
        match self {
            SampleKind::DiscreteLod => &discrete_lod::SOURCES,
            SampleKind::TreeBillboards => &tree_billboards::SOURCES,
        }
    }
}

impl std::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A content file referenced by a tileset
#[derive(Debug, Clone)]
pub struct TileAsset {
    /// File name relative to the tileset, matching its content URI
    pub file_name: String,
    pub gltf: Gltf,
}

/// Everything one sample writes
#[derive(Debug, Clone)]
pub struct SampleOutput {
    pub name: &'static str,
    pub descriptor: TilesetDescriptor,
    pub assets: Vec<TileAsset>,
}

/// Run one sample routine over its decoded sources
pub fn generate(kind: SampleKind, config: &SampleConfig, assets: Vec<Gltf>) -> Result<SampleOutput> {
    config.validate()?;
    match kind {
        SampleKind::DiscreteLod => discrete_lod::generate(config, assets),
        SampleKind::TreeBillboards => tree_billboards::generate(config, assets),
    }
}
