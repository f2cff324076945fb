//! Tileset topologies: discrete LOD chains and instanced near/far pairs

use std::collections::BTreeMap;

use crate::core::{Error, Result};
use crate::geo::Frame;
use crate::metadata::PropertyRange;
use super::bounds::BoundingVolume;
use super::descriptor::{TilesetAsset, TilesetDescriptor};
use super::tile::{Refine, TileBuilder, TileNode};

/// One resolution of a discrete LOD chain
#[derive(Debug, Clone, PartialEq)]
pub struct LodLevel {
    pub bounding_volume: BoundingVolume,
    /// Error of this level's content relative to the true geometry
    pub geometric_error: f64,
    pub content_uri: String,
    /// Local frame of the level's tile, usually only on the coarsest level
    pub transform: Option<Frame>,
}

/// Build a chain where each level's tile refines into the next.
///
/// `levels` runs **coarsest to finest**. A tile's geometric error is the
/// error introduced by *not* refining it, so tile `i` carries the content
/// error of level `i + 1` and the finest tile carries 0. The top-level
/// error is the coarsest content error times the scale composed into the
/// coarsest level's frame, since the runtime scales tile errors by their
/// transform but not the top-level value.
pub fn build_discrete_lod_chain(asset: TilesetAsset, levels: &[LodLevel]) -> Result<TilesetDescriptor> {
    let Some(coarsest) = levels.first() else {
        return Err(Error::invalid("discrete LOD chain needs at least one level"));
    };

    for level in levels {
        if !level.geometric_error.is_finite() || level.geometric_error < 0.0 {
            return Err(Error::invalid(format!(
                "level {} geometric error must be finite and >= 0, got {}",
                level.content_uri, level.geometric_error
            )));
        }
    }
    if levels.len() > 1 && levels.last().is_some_and(|finest| finest.geometric_error == 0.0) {
        // the tile above it would carry error 0 yet still have a child
        return Err(Error::topology(
            "finest level error must be > 0 when it has a coarser parent",
        ));
    }
    for pair in levels.windows(2) {
        if pair[1].geometric_error >= pair[0].geometric_error {
            return Err(Error::topology(format!(
                "level errors must strictly decrease toward the finest level: {} ({}) then {} ({})",
                pair[0].content_uri, pair[0].geometric_error, pair[1].content_uri, pair[1].geometric_error
            )));
        }
    }

    // build from the finest level up so each tile owns its child
    let mut child: Option<TileNode> = None;
    for (i, level) in levels.iter().enumerate().rev() {
        let error = levels.get(i + 1).map_or(0.0, |next| next.geometric_error);
        let mut builder = TileBuilder::new(level.bounding_volume, error).content_uri(level.content_uri.clone());
        if let Some(frame) = &level.transform {
            builder = builder.transform(frame.to_cols_array());
        }
        if i == 0 {
            builder = builder.refine(Refine::Replace);
        }
        if let Some(c) = child.take() {
            builder = builder.child(c);
        }
        child = Some(builder.build()?);
    }
    let root = child.ok_or_else(|| Error::invalid("discrete LOD chain produced no root"))?;

    let scale = coarsest.transform.as_ref().map_or(1.0, Frame::scale);
    let top_level = coarsest.geometric_error * scale;
    log::debug!("Built {}-level LOD chain (top-level error {})", levels.len(), top_level);
    TilesetDescriptor::new(asset, top_level, root)
}

/// One half of an instanced near/far pair
#[derive(Debug, Clone, PartialEq)]
pub struct InstancedLevel {
    /// Must be a region
    pub bounding_volume: BoundingVolume,
    pub geometric_error: f64,
    pub content_uri: String,
    /// Local frame the instance translations are expressed in
    pub transform: Option<Frame>,
}

/// Two-level tileset: the coarse `far` content at the root, refined by the
/// `near` content. Both tiles are region-bounded and use `REPLACE`.
///
/// Both contents must share one frame. It is written onto the root tile,
/// which the child inherits.
pub fn build_instanced_pair(
    asset: TilesetAsset,
    near: &InstancedLevel,
    far: &InstancedLevel,
    statistics: BTreeMap<String, PropertyRange>,
) -> Result<TilesetDescriptor> {
    for level in [near, far] {
        if !matches!(level.bounding_volume, BoundingVolume::Region(_)) {
            return Err(Error::invalid(format!(
                "{} must be bounded by a region, got a {}",
                level.content_uri,
                level.bounding_volume.kind()
            )));
        }
    }
    if !(far.geometric_error > near.geometric_error) {
        return Err(Error::topology(format!(
            "far error {} must exceed near error {}",
            far.geometric_error, near.geometric_error
        )));
    }

    let frame = match (near.transform, far.transform) {
        (Some(n), Some(f)) if n != f => {
            return Err(Error::invalid(format!(
                "{} and {} must share one frame",
                near.content_uri, far.content_uri
            )));
        }
        (n, f) => f.or(n),
    };

    let leaf = TileBuilder::new(near.bounding_volume, 0.0)
        .content_uri(near.content_uri.clone())
        .build()?;
    let mut root = TileBuilder::new(far.bounding_volume, near.geometric_error)
        .refine(Refine::Replace)
        .content_uri(far.content_uri.clone())
        .child(leaf);
    if let Some(frame) = &frame {
        root = root.transform(frame.to_cols_array());
    }

    let scale = frame.as_ref().map_or(1.0, Frame::scale);
    TilesetDescriptor::new(asset, far.geometric_error * scale, root.build()?)?.with_properties(statistics)
}
