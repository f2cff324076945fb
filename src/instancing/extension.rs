//! `EXT_mesh_gpu_instancing` payloads

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::core::{Error, Result};
use crate::gltf::{ComponentType, ElementType, ExtensionId, Gltf};

/// Per-instance attribute semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstanceAttribute {
    Translation,
    Rotation,
    Scale,
}

impl InstanceAttribute {
    pub const fn semantic(self) -> &'static str {
        match self {
            InstanceAttribute::Translation => "TRANSLATION",
            InstanceAttribute::Rotation => "ROTATION",
            InstanceAttribute::Scale => "SCALE",
        }
    }

    fn element_type(self) -> ElementType {
        match self {
            InstanceAttribute::Translation | InstanceAttribute::Scale => ElementType::Vec3,
            InstanceAttribute::Rotation => ElementType::Vec4,
        }
    }
}

/// Semantic to accessor index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancingBindings {
    attributes: BTreeMap<InstanceAttribute, usize>,
}

impl InstancingBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings with only a translation accessor
    pub fn translation(accessor: usize) -> Self {
        Self::new().with(InstanceAttribute::Translation, accessor)
    }

    pub fn with(mut self, attribute: InstanceAttribute, accessor: usize) -> Self {
        self.attributes.insert(attribute, accessor);
        self
    }

    pub fn get(&self, attribute: InstanceAttribute) -> Option<usize> {
        self.attributes.get(&attribute).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceAttribute, usize)> + '_ {
        self.attributes.iter().map(|(a, i)| (*a, *i))
    }

    fn to_payload(&self) -> Value {
        let attributes: Map<String, Value> = self
            .iter()
            .map(|(attribute, accessor)| (attribute.semantic().to_string(), Value::from(accessor)))
            .collect();
        json!({ "attributes": attributes })
    }
}

/// Attach the GPU instancing extension to `node`.
///
/// Every bound accessor must exist, have the element type its semantic
/// calls for, and share one instance count. The extension is registered in
/// `extensionsUsed`, and also in `extensionsRequired` when `required` is set.
/// Re-attaching replaces the node's previous payload.
pub fn attach_instancing(gltf: &mut Gltf, node: usize, bindings: &InstancingBindings, required: bool) -> Result<()> {
    let target = gltf
        .nodes
        .get(node)
        .ok_or_else(|| Error::invalid(format!("node {} does not exist ({} nodes)", node, gltf.nodes.len())))?;
    if target.mesh.is_none() {
        return Err(Error::invalid(format!("node {} has no mesh to instance", node)));
    }
    if bindings.is_empty() {
        return Err(Error::invalid("instancing needs at least one attribute binding"));
    }

    let mut count = None;
    for (attribute, index) in bindings.iter() {
        let accessor = gltf.accessor(index)?;
        if accessor.component_type != ComponentType::Float || accessor.element_type != attribute.element_type() {
            return Err(Error::invalid(format!(
                "{} accessor {} is {:?} {:?}, expected float {:?}",
                attribute.semantic(),
                index,
                accessor.component_type,
                accessor.element_type,
                attribute.element_type()
            )));
        }
        match count {
            None => count = Some(accessor.count),
            Some(n) if n != accessor.count => {
                return Err(Error::invalid(format!(
                    "{} accessor {} has {} elements, other bindings have {}",
                    attribute.semantic(),
                    index,
                    accessor.count,
                    n
                )));
            }
            Some(_) => {}
        }
    }

    gltf.node_mut(node)?
        .extensions
        .insert(ExtensionId::MeshGpuInstancing.name().to_string(), bindings.to_payload());
    gltf.use_extension(ExtensionId::MeshGpuInstancing, required);

    log::debug!(
        "Attached {} to node {} ({} instances)",
        ExtensionId::MeshGpuInstancing,
        node,
        count.unwrap_or_default()
    );
    Ok(())
}
