//! glTF 2.0 document model
//!
//! Only the parts of a document that the generator reads or mutates are
//! typed. Everything else (materials, images, scenes, animations...) is kept
//! in flattened passthrough maps so a decoded asset re-encodes unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{Error, Result};
use super::extensions::{ExtensionId, ExtensionSet};

/// Per-object extension payloads keyed by extension name
pub type Extensions = Map<String, Value>;

fn is_zero(v: &usize) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Accessor component type (`componentType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    UnsignedInt,
    Float,
}

impl ComponentType {
    /// Size of one component in bytes
    pub const fn size(self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::UnsignedInt | ComponentType::Float => 4,
        }
    }

    pub const fn code(self) -> u32 {
        match self {
            ComponentType::Byte => 5120,
            ComponentType::UnsignedByte => 5121,
            ComponentType::Short => 5122,
            ComponentType::UnsignedShort => 5123,
            ComponentType::UnsignedInt => 5125,
            ComponentType::Float => 5126,
        }
    }
}

impl From<ComponentType> for u32 {
    fn from(c: ComponentType) -> u32 {
        c.code()
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, Self::Error> {
        match code {
            5120 => Ok(ComponentType::Byte),
            5121 => Ok(ComponentType::UnsignedByte),
            5122 => Ok(ComponentType::Short),
            5123 => Ok(ComponentType::UnsignedShort),
            5125 => Ok(ComponentType::UnsignedInt),
            5126 => Ok(ComponentType::Float),
            other => Err(format!("unknown component type {}", other)),
        }
    }
}

/// Accessor element type (`type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    /// Number of components per element
    pub const fn components(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 | ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Typed view into a buffer view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<f64>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Accessor {
    /// Size of one element in bytes (tightly packed)
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.element_type.components()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    pub byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Extensions,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Primitive {
    pub attributes: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<usize>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Extensions,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Byte range an accessor reads from one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRegion {
    pub buffer: usize,
    pub offset: usize,
    pub length: usize,
}

impl BufferRegion {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// A decoded glTF asset: the JSON document plus resolved buffer bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gltf {
    pub asset: AssetInfo,
    #[serde(default, skip_serializing_if = "ExtensionSet::is_empty")]
    pub extensions_used: ExtensionSet,
    #[serde(default, skip_serializing_if = "ExtensionSet::is_empty")]
    pub extensions_required: ExtensionSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<Mesh>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Extensions,
    #[serde(flatten)]
    pub other: Map<String, Value>,
    /// Resolved bytes for each entry of `buffers`
    #[serde(skip)]
    buffer_data: Vec<Vec<u8>>,
}

impl Default for Gltf {
    fn default() -> Self {
        Self::new()
    }
}

impl Gltf {
    /// Empty glTF 2.0 document
    pub fn new() -> Self {
        Self {
            asset: AssetInfo {
                version: "2.0".to_string(),
                generator: Some(concat!("tilesynth ", env!("CARGO_PKG_VERSION")).to_string()),
                other: Map::new(),
            },
            extensions_used: ExtensionSet::new(),
            extensions_required: ExtensionSet::new(),
            accessors: Vec::new(),
            buffer_views: Vec::new(),
            buffers: Vec::new(),
            meshes: Vec::new(),
            nodes: Vec::new(),
            extensions: Map::new(),
            other: Map::new(),
            buffer_data: Vec::new(),
        }
    }

    /// Resolved bytes of buffer `index`
    pub fn buffer_bytes(&self, index: usize) -> Option<&[u8]> {
        self.buffer_data.get(index).map(Vec::as_slice)
    }

    pub(crate) fn buffer_bytes_mut(&mut self, index: usize) -> Option<&mut Vec<u8>> {
        self.buffer_data.get_mut(index)
    }

    /// Append a buffer with its bytes, returning its index
    pub fn push_buffer(&mut self, bytes: Vec<u8>) -> usize {
        let index = self.buffers.len();
        self.buffers.push(Buffer {
            byte_length: bytes.len(),
            uri: None,
            other: Map::new(),
        });
        self.buffer_data.push(bytes);
        index
    }

    /// Bind resolved bytes to the declared buffers.
    ///
    /// Each entry is truncated to the buffer's `byteLength`; container
    /// padding past that length is dropped.
    pub(crate) fn attach_buffer_data(&mut self, mut data: Vec<Vec<u8>>) -> Result<()> {
        if data.len() != self.buffers.len() {
            return Err(Error::Container(format!(
                "{} buffers declared but {} resolved",
                self.buffers.len(),
                data.len()
            )));
        }
        for (i, (bytes, buffer)) in data.iter_mut().zip(&self.buffers).enumerate() {
            if bytes.len() < buffer.byte_length {
                return Err(Error::Container(format!(
                    "buffer {} declares {} bytes but only {} are available",
                    i,
                    buffer.byte_length,
                    bytes.len()
                )));
            }
            bytes.truncate(buffer.byte_length);
        }
        self.buffer_data = data;
        Ok(())
    }

    /// Copy of the JSON part of the document, without buffer bytes
    pub(crate) fn json_only(&self) -> Gltf {
        Gltf {
            asset: self.asset.clone(),
            extensions_used: self.extensions_used.clone(),
            extensions_required: self.extensions_required.clone(),
            accessors: self.accessors.clone(),
            buffer_views: self.buffer_views.clone(),
            buffers: self.buffers.clone(),
            meshes: self.meshes.clone(),
            nodes: self.nodes.clone(),
            extensions: self.extensions.clone(),
            other: self.other.clone(),
            buffer_data: Vec::new(),
        }
    }

    pub fn node(&self, index: usize) -> Result<&Node> {
        self.nodes
            .get(index)
            .ok_or_else(|| Error::dangling(format!("node {} does not exist ({} nodes)", index, self.nodes.len())))
    }

    pub fn node_mut(&mut self, index: usize) -> Result<&mut Node> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .ok_or_else(|| Error::dangling(format!("node {} does not exist ({} nodes)", index, len)))
    }

    pub fn accessor(&self, index: usize) -> Result<&Accessor> {
        self.accessors.get(index).ok_or_else(|| {
            Error::dangling(format!("accessor {} does not exist ({} accessors)", index, self.accessors.len()))
        })
    }

    pub fn primitive(&self, mesh: usize, primitive: usize) -> Result<&Primitive> {
        self.meshes
            .get(mesh)
            .ok_or_else(|| Error::dangling(format!("mesh {} does not exist", mesh)))?
            .primitives
            .get(primitive)
            .ok_or_else(|| Error::dangling(format!("mesh {} has no primitive {}", mesh, primitive)))
    }

    pub fn primitive_mut(&mut self, mesh: usize, primitive: usize) -> Result<&mut Primitive> {
        self.meshes
            .get_mut(mesh)
            .ok_or_else(|| Error::dangling(format!("mesh {} does not exist", mesh)))?
            .primitives
            .get_mut(primitive)
            .ok_or_else(|| Error::dangling(format!("mesh {} has no primitive {}", mesh, primitive)))
    }

    /// Mark an extension as used (and optionally required)
    pub fn use_extension(&mut self, id: ExtensionId, required: bool) {
        self.extensions_used.insert(id);
        if required {
            self.extensions_required.insert(id);
        }
    }

    /// Resolve an accessor to the buffer bytes it reads.
    ///
    /// Returns `None` for accessors without a buffer view (all-zero data).
    pub fn accessor_region(&self, index: usize) -> Result<Option<BufferRegion>> {
        let accessor = self.accessor(index)?;
        let Some(view_index) = accessor.buffer_view else {
            return Ok(None);
        };
        let view = self.buffer_views.get(view_index).ok_or_else(|| {
            Error::dangling(format!("accessor {} references missing bufferView {}", index, view_index))
        })?;
        if view.buffer >= self.buffers.len() {
            return Err(Error::dangling(format!(
                "bufferView {} references missing buffer {}",
                view_index, view.buffer
            )));
        }

        let element = accessor.element_size();
        let stride = view.byte_stride.unwrap_or(element);
        let length = match accessor.count {
            0 => 0,
            n => stride * (n - 1) + element,
        };

        Ok(Some(BufferRegion {
            buffer: view.buffer,
            offset: view.byte_offset + accessor.byte_offset,
            length,
        }))
    }

    /// Check the structural invariants the generator relies on: every
    /// accessor reads inside its buffer view and buffer, every extension
    /// payload references existing accessors and feature tables, and every
    /// required extension is also used.
    pub fn validate(&self) -> Result<()> {
        for (i, buffer) in self.buffers.iter().enumerate() {
            if let Some(bytes) = self.buffer_data.get(i) {
                if bytes.len() < buffer.byte_length {
                    return Err(Error::dangling(format!(
                        "buffer {} holds {} bytes but declares {}",
                        i,
                        bytes.len(),
                        buffer.byte_length
                    )));
                }
            }
        }

        for (i, view) in self.buffer_views.iter().enumerate() {
            let buffer = self.buffers.get(view.buffer).ok_or_else(|| {
                Error::dangling(format!("bufferView {} references missing buffer {}", i, view.buffer))
            })?;
            if view.byte_offset + view.byte_length > buffer.byte_length {
                return Err(Error::dangling(format!(
                    "bufferView {} spans {}..{} past buffer {} ({} bytes)",
                    i,
                    view.byte_offset,
                    view.byte_offset + view.byte_length,
                    view.buffer,
                    buffer.byte_length
                )));
            }
        }

        for i in 0..self.accessors.len() {
            let Some(region) = self.accessor_region(i)? else {
                continue;
            };
            let view_index = self.accessors[i].buffer_view.unwrap_or_default();
            let view = &self.buffer_views[view_index];
            if region.end() > view.byte_offset + view.byte_length {
                return Err(Error::dangling(format!(
                    "accessor {} reads {}..{} past bufferView {}",
                    i,
                    region.offset,
                    region.end(),
                    view_index
                )));
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(mesh) = node.mesh {
                if mesh >= self.meshes.len() {
                    return Err(Error::dangling(format!("node {} references missing mesh {}", i, mesh)));
                }
            }
            if let Some(payload) = node.extensions.get(ExtensionId::MeshGpuInstancing.name()) {
                let attributes = payload.get("attributes").and_then(Value::as_object);
                for (semantic, accessor) in attributes.into_iter().flatten() {
                    let index = accessor.as_u64().ok_or_else(|| {
                        Error::dangling(format!("node {} binds {} to a non-index value", i, semantic))
                    })?;
                    self.accessor(index as usize)?;
                }
            }
        }

        let table_count = self
            .extensions
            .get(ExtensionId::FeatureMetadata.name())
            .and_then(|ext| ext.get("featureTables"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        for (m, mesh) in self.meshes.iter().enumerate() {
            for (p, primitive) in mesh.primitives.iter().enumerate() {
                let layers = primitive
                    .extensions
                    .get(ExtensionId::FeatureMetadata.name())
                    .and_then(|ext| ext.get("featureLayers"))
                    .and_then(Value::as_array);
                for layer in layers.into_iter().flatten() {
                    let table = layer.get("featureTable").and_then(Value::as_u64);
                    match table {
                        Some(t) if (t as usize) < table_count => {}
                        _ => {
                            return Err(Error::dangling(format!(
                                "mesh {} primitive {} layer references feature table {:?} ({} tables)",
                                m, p, table, table_count
                            )));
                        }
                    }
                }
            }
        }

        if !self.extensions_used.is_superset(&self.extensions_required) {
            return Err(Error::dangling(format!(
                "extensionsRequired {:?} not all listed in extensionsUsed {:?}",
                self.extensions_required.names(),
                self.extensions_used.names()
            )));
        }

        Ok(())
    }
}
