//! Reading source meshes and writing tilesets

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tokio::task::JoinSet;

use crate::core::{Error, Result};
use crate::gltf::{BufferEmbedding, Gltf, decode_glb, decode_gltf, encode_glb, encode_gltf};
use crate::samples::{OutputOptions, SampleConfig, SampleOutput};
use crate::tileset::TilesetDescriptor;

const TILESET_FILE: &str = "tileset.json";

fn with_path(path: &Path, e: std::io::Error) -> Error {
    Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
}

/// Decode either serialization, picked by the `glTF` magic
pub fn decode_asset(bytes: &[u8]) -> Result<Gltf> {
    if bytes.starts_with(b"glTF") {
        decode_glb(bytes)
    } else {
        decode_gltf(bytes)
    }
}

pub async fn read_asset(path: &Path) -> Result<Gltf> {
    let bytes = tokio::fs::read(path).await.map_err(|e| with_path(path, e))?;
    let gltf = decode_asset(&bytes)?;
    log::debug!("Read {} ({} bytes, {} nodes)", path.display(), bytes.len(), gltf.nodes.len());
    Ok(gltf)
}

/// Read several assets concurrently. The result is in `paths` order.
pub async fn read_assets(paths: &[PathBuf]) -> Result<Vec<Gltf>> {
    let mut tasks = JoinSet::new();
    for (i, path) in paths.iter().cloned().enumerate() {
        tasks.spawn(async move { (i, read_asset(&path).await) });
    }

    let mut slots: Vec<Option<Gltf>> = vec![None; paths.len()];
    while let Some(joined) = tasks.join_next().await {
        let (i, result) = joined.map_err(|e| Error::Io(std::io::Error::other(e)))?;
        slots[i] = Some(result?);
    }
    slots
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| slot.ok_or_else(|| Error::Container(format!("{} was never read", path.display()))))
        .collect()
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Encode an asset into the file(s) its name calls for: `.glb` is one
/// self-contained file, `.gltf` may bring sidecar buffers.
pub fn encode_asset(file_name: &str, gltf: &Gltf, options: &OutputOptions) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = if let Some(stem) = file_name.strip_suffix(".glb") {
        if stem.is_empty() {
            return Err(Error::invalid(format!("content name {} has no stem", file_name)));
        }
        vec![(file_name.to_string(), encode_glb(gltf)?)]
    } else if let Some(stem) = file_name.strip_suffix(".gltf") {
        let embedding = if options.embed_binary_inline {
            BufferEmbedding::Inline
        } else {
            BufferEmbedding::External { stem: stem.to_string() }
        };
        let encoded = encode_gltf(gltf, &embedding, options.pretty_print)?;
        let mut files = vec![(file_name.to_string(), encoded.json)];
        files.extend(encoded.sidecars);
        files
    } else {
        return Err(Error::invalid(format!("content name {} is neither .glb nor .gltf", file_name)));
    };

    if options.compress {
        for (_, bytes) in &mut files {
            *bytes = gzip(bytes)?;
        }
    }
    Ok(files)
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| with_path(parent, e))?;
    }
    tokio::fs::write(path, bytes).await.map_err(|e| with_path(path, e))?;
    log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Write an asset (and any sidecar buffers) into `dir`
pub async fn write_asset(dir: &Path, file_name: &str, gltf: &Gltf, options: &OutputOptions) -> Result<Vec<PathBuf>> {
    gltf.validate()?;
    let files = encode_asset(file_name, gltf, options)?;

    let mut written = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let path = dir.join(name);
        write_file(&path, &bytes).await?;
        written.push(path);
    }
    Ok(written)
}

pub async fn write_descriptor(path: &Path, descriptor: &TilesetDescriptor, options: &OutputOptions) -> Result<()> {
    descriptor.validate()?;
    let mut bytes = descriptor.to_json(options.pretty_print)?;
    if options.compress {
        bytes = gzip(&bytes)?;
    }
    write_file(path, &bytes).await
}

/// Write a generated sample into `<output>/Samples/<name>/`.
///
/// Everything is validated and encoded before the first file is written, so
/// a sample that fails produces no output.
pub async fn write_sample(config: &SampleConfig, output: &SampleOutput) -> Result<Vec<PathBuf>> {
    let options = &config.output;
    let dir = config.sample_dir(output.name);

    output.descriptor.validate()?;
    let mut descriptor = output.descriptor.to_json(options.pretty_print)?;
    if options.compress {
        descriptor = gzip(&descriptor)?;
    }
    let mut files = vec![(TILESET_FILE.to_string(), descriptor)];
    for asset in &output.assets {
        asset.gltf.validate()?;
        files.extend(encode_asset(&asset.file_name, &asset.gltf, options)?);
    }

    let mut written = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let path = dir.join(name);
        write_file(&path, &bytes).await?;
        written.push(path);
    }
    Ok(written)
}
