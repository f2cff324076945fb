//! Per-instance placement and the GPU instancing extension

pub mod placement;
pub mod extension;

pub use placement::{InstanceSet, ModelAnchor, checked_count, generate_positions};
pub use extension::{InstanceAttribute, InstancingBindings, attach_instancing};
