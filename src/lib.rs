//! Tilesynth - procedural 3D Tiles sample generator
//!
//! Builds small georeferenced tilesets for exercising hierarchical LOD
//! streaming: east-north-up frames, instanced meshes with per-instance
//! feature metadata, and validated tileset hierarchies.

pub mod core;
pub mod geo;
pub mod gltf;
pub mod instancing;
pub mod metadata;
pub mod tileset;
pub mod samples;
pub mod io;
