//! Appending typed data to an asset's binary storage

use glam::{Quat, Vec3, Vec4};
use serde_json::Map;

use crate::core::{Error, Result};
use super::document::{Accessor, BufferView, ComponentType, ElementType, Gltf};

/// Byte alignment of every region appended to a buffer
pub const BUFFER_ALIGNMENT: usize = 4;

// Values are copied in native byte order; glTF buffers are little-endian.
const _: () = assert!(cfg!(target_endian = "little"));

/// A value that can be stored as one accessor element
pub trait AccessorElement: bytemuck::Pod {
    const COMPONENT_TYPE: ComponentType;
    const ELEMENT_TYPE: ElementType;

    /// Component `i` as f64, for accessor min/max
    fn component(&self, i: usize) -> f64;
}

impl AccessorElement for f32 {
    const COMPONENT_TYPE: ComponentType = ComponentType::Float;
    const ELEMENT_TYPE: ElementType = ElementType::Scalar;

    fn component(&self, _i: usize) -> f64 {
        *self as f64
    }
}

impl AccessorElement for u16 {
    const COMPONENT_TYPE: ComponentType = ComponentType::UnsignedShort;
    const ELEMENT_TYPE: ElementType = ElementType::Scalar;

    fn component(&self, _i: usize) -> f64 {
        *self as f64
    }
}

impl AccessorElement for u32 {
    const COMPONENT_TYPE: ComponentType = ComponentType::UnsignedInt;
    const ELEMENT_TYPE: ElementType = ElementType::Scalar;

    fn component(&self, _i: usize) -> f64 {
        *self as f64
    }
}

impl AccessorElement for Vec3 {
    const COMPONENT_TYPE: ComponentType = ComponentType::Float;
    const ELEMENT_TYPE: ElementType = ElementType::Vec3;

    fn component(&self, i: usize) -> f64 {
        self[i] as f64
    }
}

impl AccessorElement for Vec4 {
    const COMPONENT_TYPE: ComponentType = ComponentType::Float;
    const ELEMENT_TYPE: ElementType = ElementType::Vec4;

    fn component(&self, i: usize) -> f64 {
        self[i] as f64
    }
}

impl AccessorElement for Quat {
    const COMPONENT_TYPE: ComponentType = ComponentType::Float;
    const ELEMENT_TYPE: ElementType = ElementType::Vec4;

    fn component(&self, i: usize) -> f64 {
        self.to_array()[i] as f64
    }
}

fn align_up(len: usize, alignment: usize) -> usize {
    len.div_ceil(alignment) * alignment
}

/// Append `values` to the asset's first buffer and describe them with a new
/// buffer view and accessor. Returns the accessor index.
///
/// The data is written after the current end of buffer 0, padded to
/// [`BUFFER_ALIGNMENT`]; buffer 0 is created if the asset has none. Existing
/// bytes are never moved, so accessor indices and regions taken before the
/// call stay valid.
pub fn append_buffer<T: AccessorElement>(gltf: &mut Gltf, values: &[T]) -> Result<usize> {
    if values.is_empty() {
        return Err(Error::invalid("cannot append an empty accessor"));
    }

    if gltf.buffers.is_empty() {
        gltf.push_buffer(Vec::new());
    }

    let bytes: &[u8] = bytemuck::cast_slice(values);
    let data = gltf
        .buffer_bytes_mut(0)
        .ok_or_else(|| Error::dangling("buffer 0 has no resolved data"))?;
    let byte_offset = align_up(data.len(), BUFFER_ALIGNMENT);
    data.resize(byte_offset, 0);
    data.extend_from_slice(bytes);
    let total = data.len();
    gltf.buffers[0].byte_length = total;

    let view_index = gltf.buffer_views.len();
    gltf.buffer_views.push(BufferView {
        buffer: 0,
        byte_offset,
        byte_length: bytes.len(),
        byte_stride: None,
        target: None,
        other: Map::new(),
    });

    let components = T::ELEMENT_TYPE.components();
    let mut min = vec![f64::INFINITY; components];
    let mut max = vec![f64::NEG_INFINITY; components];
    for value in values {
        for c in 0..components {
            let v = value.component(c);
            min[c] = min[c].min(v);
            max[c] = max[c].max(v);
        }
    }

    let accessor_index = gltf.accessors.len();
    gltf.accessors.push(Accessor {
        buffer_view: Some(view_index),
        byte_offset: 0,
        component_type: T::COMPONENT_TYPE,
        normalized: false,
        count: values.len(),
        element_type: T::ELEMENT_TYPE,
        min: Some(min),
        max: Some(max),
        other: Map::new(),
    });

    log::debug!(
        "Appended accessor {} ({} x {:?}) at byte {} of buffer 0",
        accessor_index,
        values.len(),
        T::ELEMENT_TYPE,
        byte_offset
    );

    Ok(accessor_index)
}
