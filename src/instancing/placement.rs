//! Instance placement within a square tile footprint
//!
//! Instances sit on a jittered grid: one cell per instance, each position
//! nudged by at most a quarter cell so no two instances can coincide. The
//! RNG is seeded from the inputs, so the same request always yields the
//! same positions.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::{Error, Result};
use crate::geo::Frame;

/// Maximum jitter as a fraction of a grid cell, per axis
const JITTER: f64 = 0.25;

/// Where a model's local origin sits relative to its geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelAnchor {
    /// Origin at the base of the model (trees)
    #[default]
    Base,
    /// Origin at the center of the model (billboards)
    Center,
}

impl ModelAnchor {
    /// Height the origin must sit above the ground for the geometry to
    /// clear it
    pub fn lift(self, model_size: f64) -> f64 {
        match self {
            ModelAnchor::Base => 0.0,
            ModelAnchor::Center => model_size / 2.0,
        }
    }
}

/// Ordered instance translations in frame-local coordinates
/// (x east, y north, z up)
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSet {
    positions: Vec<Vec3>,
    footprint_width: f64,
}

impl InstanceSet {
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<Vec3> {
        self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn footprint_width(&self) -> f64 {
        self.footprint_width
    }

    /// Re-express positions given in `from` in the local coordinates of `to`
    pub fn rebase(self, from: &Frame, to: &Frame) -> InstanceSet {
        let positions = self
            .positions
            .into_iter()
            .map(|p| to.global_to_local(from.local_to_global(p.as_dvec3())).as_vec3())
            .collect();
        InstanceSet { positions, footprint_width: self.footprint_width }
    }

    /// Positions in glTF axes (x east, y up, z south). Tile content is y-up
    /// and the runtime rotates it into the tile's z-up frame.
    pub fn gltf_translations(&self) -> Vec<Vec3> {
        self.positions.iter().map(|p| Vec3::new(p.x, p.z, -p.y)).collect()
    }
}

/// Convert a signed count from an outer boundary (config, CLI) into an
/// instance count
pub fn checked_count(count: i64) -> Result<usize> {
    usize::try_from(count).map_err(|_| Error::invalid(format!("instance count must be >= 0, got {}", count)))
}

fn seed_for(count: usize, footprint_width: f64, model_size: f64, frame: &Frame) -> u64 {
    let mut mix = 0x9E37_79B9_7F4A_7C15u64 ^ (count as u64).rotate_left(17);
    mix ^= footprint_width.to_bits().rotate_left(29);
    mix ^= model_size.to_bits().rotate_left(41);
    for v in frame.to_cols_array() {
        mix = mix.rotate_left(7) ^ v.to_bits();
    }
    mix
}

/// Distribute `count` instances across a `footprint_width` square centered
/// on the frame origin.
///
/// The up component keeps the model clear of the ground plane: an anchor
/// lift of `model_size / 2` for centered models, reduced by however much the
/// frame itself is already raised.
pub fn generate_positions(
    count: usize,
    footprint_width: f64,
    model_size: f64,
    anchor: ModelAnchor,
    frame: &Frame,
) -> Result<InstanceSet> {
    if !footprint_width.is_finite() || footprint_width <= 0.0 {
        return Err(Error::invalid(format!("footprint width must be positive, got {}", footprint_width)));
    }
    if !model_size.is_finite() || model_size < 0.0 {
        return Err(Error::invalid(format!("model size must be >= 0, got {}", model_size)));
    }

    if count == 0 {
        return Ok(InstanceSet { positions: Vec::new(), footprint_width });
    }

    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    let cell_x = footprint_width / cols as f64;
    let cell_y = footprint_width / rows as f64;
    let half = footprint_width / 2.0;
    let up = (anchor.lift(model_size) - frame.height()).max(0.0);

    let mut rng = ChaCha8Rng::seed_from_u64(seed_for(count, footprint_width, model_size, frame));
    let mut positions = Vec::with_capacity(count);
    for i in 0..count {
        let (col, row) = (i % cols, i / cols);
        let cx = -half + (col as f64 + 0.5) * cell_x;
        let cy = -half + (row as f64 + 0.5) * cell_y;

        let jx = (rng.random::<f64>() - 0.5) * 2.0 * JITTER * cell_x;
        let jy = (rng.random::<f64>() - 0.5) * 2.0 * JITTER * cell_y;

        positions.push(Vec3::new((cx + jx) as f32, (cy + jy) as f32, up as f32));
    }

    log::debug!(
        "Placed {} instances on a {}x{} grid over {} m (up {:.2})",
        count,
        cols,
        rows,
        footprint_width,
        up
    );

    Ok(InstanceSet { positions, footprint_width })
}
