//! Tileset hierarchy
//!
//! Typed tiles and descriptors that are checked when they are built, plus
//! builders for the topologies the samples use.

pub mod bounds;
pub mod tile;
pub mod descriptor;
pub mod builder;

pub use bounds::{BoundingVolume, RawBoundingVolume};
pub use tile::{Refine, TileBuilder, TileContent, TileNode};
pub use descriptor::{CONTENT_GLTF_EXTENSION, TilesetAsset, TilesetDescriptor, TilesetExtras};
pub use builder::{InstancedLevel, LodLevel, build_discrete_lod_chain, build_instanced_pair};
