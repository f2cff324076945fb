//! Filesystem collaborators
//!
//! Async reading and decoding of source meshes, async persistence of
//! descriptors and assets, and the run that ties them to the sample
//! routines.

pub mod disk;
pub mod pipeline;

pub use disk::{decode_asset, encode_asset, read_asset, read_assets, write_asset, write_descriptor, write_sample};
pub use pipeline::{RunSummary, run};
