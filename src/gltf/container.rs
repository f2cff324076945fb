//! `.gltf` / `.glb` codecs
//!
//! Two interchangeable serializations of the same asset: the plain JSON form
//! with buffers as base64 data URIs (or sidecar files), and the binary
//! container with buffer 0 stored in a BIN chunk.

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ::gltf::Glb;
use ::gltf::binary::Header;

use crate::core::{Error, Result};
use super::document::Gltf;

const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

/// Where buffer bytes go when writing the plain JSON form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEmbedding {
    /// Every buffer becomes a base64 data URI
    Inline,
    /// Every buffer becomes a sidecar file named after `stem`
    External { stem: String },
}

/// Plain JSON form plus any sidecar buffer files
#[derive(Debug, Clone)]
pub struct EncodedGltf {
    pub json: Vec<u8>,
    /// (relative file name, bytes)
    pub sidecars: Vec<(String, Vec<u8>)>,
}

fn data_uri(bytes: &[u8]) -> String {
    format!("{}{}", DATA_URI_PREFIX, BASE64.encode(bytes))
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let payload = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, data)| data)
        .ok_or_else(|| Error::Container(format!("external buffer URI not supported: {}", truncate(uri))))?;
    BASE64
        .decode(payload)
        .map_err(|e| Error::Container(format!("invalid base64 buffer: {}", e)))
}

fn truncate(uri: &str) -> &str {
    match uri.char_indices().nth(64) {
        Some((i, _)) => &uri[..i],
        None => uri,
    }
}

/// Resolve every declared buffer, binding `bin` (if any) to the first
/// buffer without a URI.
fn resolve_buffers(gltf: &mut Gltf, mut bin: Option<&[u8]>) -> Result<()> {
    let mut data = Vec::with_capacity(gltf.buffers.len());
    for (i, buffer) in gltf.buffers.iter().enumerate() {
        let bytes = match &buffer.uri {
            Some(uri) => decode_data_uri(uri)?,
            None if i == 0 => bin
                .take()
                .ok_or_else(|| Error::Container("buffer 0 has no URI and no BIN chunk".into()))?
                .to_vec(),
            None => {
                return Err(Error::Container(format!("buffer {} has no URI", i)));
            }
        };
        data.push(bytes);
    }
    gltf.attach_buffer_data(data)?;
    for buffer in &mut gltf.buffers {
        buffer.uri = None;
    }
    Ok(())
}

/// Decode the plain JSON form
pub fn decode_gltf(bytes: &[u8]) -> Result<Gltf> {
    let mut gltf: Gltf = serde_json::from_slice(bytes)?;
    resolve_buffers(&mut gltf, None)?;
    Ok(gltf)
}

/// Decode the binary container form
pub fn decode_glb(data: &[u8]) -> Result<Gltf> {
    let glb = Glb::from_slice(data).map_err(|e| Error::Container(format!("invalid binary container: {}", e)))?;
    let mut gltf: Gltf = serde_json::from_slice(&glb.json)?;
    resolve_buffers(&mut gltf, glb.bin.as_deref())?;
    Ok(gltf)
}

/// Encode the binary container form.
///
/// Buffer 0 is stored in the BIN chunk; any further buffers are embedded as
/// data URIs. Chunk padding is left to the container writer.
pub fn encode_glb(gltf: &Gltf) -> Result<Vec<u8>> {
    let mut doc = gltf.json_only();
    let mut bin = None;
    for (i, buffer) in doc.buffers.iter_mut().enumerate() {
        let bytes = gltf
            .buffer_bytes(i)
            .ok_or_else(|| Error::dangling(format!("buffer {} has no resolved data", i)))?;
        if i == 0 {
            buffer.uri = None;
            bin = Some(Cow::Borrowed(bytes));
        } else {
            buffer.uri = Some(data_uri(bytes));
        }
    }

    let json = serde_json::to_vec(&doc)?;
    let total = 12 + 8 + json.len().next_multiple_of(4) + bin.as_ref().map_or(0, |b| 8 + b.len().next_multiple_of(4));
    let length = u32::try_from(total)
        .map_err(|_| Error::Container(format!("{} bytes exceeds the container limit", total)))?;

    let glb = Glb { header: Header { magic: *b"glTF", version: 2, length }, json: Cow::Owned(json), bin };
    glb.to_vec().map_err(|e| Error::Container(format!("failed to write binary container: {}", e)))
}

/// Encode the plain JSON form
pub fn encode_gltf(gltf: &Gltf, embedding: &BufferEmbedding, pretty: bool) -> Result<EncodedGltf> {
    let mut doc = gltf.json_only();
    let mut sidecars = Vec::new();
    for (i, buffer) in doc.buffers.iter_mut().enumerate() {
        let bytes = gltf
            .buffer_bytes(i)
            .ok_or_else(|| Error::dangling(format!("buffer {} has no resolved data", i)))?;
        match embedding {
            BufferEmbedding::Inline => buffer.uri = Some(data_uri(bytes)),
            BufferEmbedding::External { stem } => {
                let name = match i {
                    0 => format!("{}.bin", stem),
                    n => format!("{}_{}.bin", stem, n),
                };
                buffer.uri = Some(name.clone());
                sidecars.push((name, bytes.to_vec()));
            }
        }
    }

    let json = if pretty {
        serde_json::to_vec_pretty(&doc)?
    } else {
        serde_json::to_vec(&doc)?
    };
    Ok(EncodedGltf { json, sidecars })
}
