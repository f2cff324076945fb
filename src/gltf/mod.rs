//! glTF asset model and binary plumbing
//!
//! The generator treats a mesh asset as a typed glTF document plus its
//! resolved buffer bytes. This module owns that model, the extension
//! registry, appending new binary data, and the `.gltf` / `.glb` codecs.

pub mod document;
pub mod extensions;
pub mod buffer;
pub mod container;

pub use document::{
    Accessor, AssetInfo, Buffer, BufferRegion, BufferView, ComponentType, ElementType, Extensions,
    Gltf, Mesh, Node, Primitive,
};
pub use extensions::{ExtensionId, ExtensionSet};
pub use buffer::{AccessorElement, BUFFER_ALIGNMENT, append_buffer};
pub use container::{BufferEmbedding, EncodedGltf, decode_glb, decode_gltf, encode_glb, encode_gltf};

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use serde_json::{Map, json};

    use super::*;

    /// One node, one mesh, one indexed triangle. The buffer is 42 bytes
    /// (36 of positions, 6 of u16 indices) so the next region needs padding.
    pub fn triangle() -> Gltf {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let indices: [u16; 3] = [0, 1, 2];

        let mut bytes = bytemuck::cast_slice::<_, u8>(&positions).to_vec();
        bytes.extend_from_slice(bytemuck::cast_slice(&indices));

        let mut gltf = Gltf::new();
        gltf.push_buffer(bytes);
        gltf.buffer_views = vec![
            BufferView { buffer: 0, byte_offset: 0, byte_length: 36, byte_stride: None, target: Some(34962), other: Map::new() },
            BufferView { buffer: 0, byte_offset: 36, byte_length: 6, byte_stride: None, target: Some(34963), other: Map::new() },
        ];
        gltf.accessors = vec![
            Accessor {
                buffer_view: Some(0),
                byte_offset: 0,
                component_type: ComponentType::Float,
                normalized: false,
                count: 3,
                element_type: ElementType::Vec3,
                min: Some(vec![0.0, 0.0, 0.0]),
                max: Some(vec![1.0, 1.0, 0.0]),
                other: Map::new(),
            },
            Accessor {
                buffer_view: Some(1),
                byte_offset: 0,
                component_type: ComponentType::UnsignedShort,
                normalized: false,
                count: 3,
                element_type: ElementType::Scalar,
                min: None,
                max: None,
                other: Map::new(),
            },
        ];
        gltf.meshes = vec![Mesh {
            primitives: vec![Primitive {
                attributes: BTreeMap::from([("POSITION".to_string(), 0)]),
                indices: Some(1),
                ..Default::default()
            }],
            other: Map::new(),
        }];
        gltf.nodes = vec![Node { mesh: Some(0), ..Default::default() }];
        gltf.other.insert("materials".to_string(), json!([{ "name": "bark" }]));
        gltf.other.insert("scenes".to_string(), json!([{ "nodes": [0] }]));
        gltf
    }
}
