//! Tile bounding volumes

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Exactly one of the three 3D Tiles bounding volume kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingVolume", into = "RawBoundingVolume")]
pub enum BoundingVolume {
    /// `[west, south, east, north, min_height, max_height]`, radians and meters
    Region([f64; 6]),
    /// Center followed by the x, y and z half-axes
    Box([f64; 12]),
    /// Center and radius
    Sphere([f64; 4]),
}

/// Wire form of a bounding volume, before the one-kind rule is checked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBoundingVolume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Vec<f64>>,
    #[serde(default, rename = "box", skip_serializing_if = "Option::is_none")]
    pub box_: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sphere: Option<Vec<f64>>,
}

fn fixed<const N: usize>(kind: &str, values: Vec<f64>) -> Result<[f64; N]> {
    let len = values.len();
    <[f64; N]>::try_from(values)
        .map_err(|_| Error::invalid(format!("{} needs {} values, got {}", kind, N, len)))
}

impl BoundingVolume {
    pub fn region(values: [f64; 6]) -> Result<Self> {
        let volume = BoundingVolume::Region(values);
        volume.validate()?;
        Ok(volume)
    }

    pub fn oriented_box(values: [f64; 12]) -> Result<Self> {
        let volume = BoundingVolume::Box(values);
        volume.validate()?;
        Ok(volume)
    }

    pub fn sphere(values: [f64; 4]) -> Result<Self> {
        let volume = BoundingVolume::Sphere(values);
        volume.validate()?;
        Ok(volume)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BoundingVolume::Region(_) => "region",
            BoundingVolume::Box(_) => "box",
            BoundingVolume::Sphere(_) => "sphere",
        }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            BoundingVolume::Region(v) => v,
            BoundingVolume::Box(v) => v,
            BoundingVolume::Sphere(v) => v,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(bad) = self.values().iter().find(|v| !v.is_finite()) {
            return Err(Error::invalid(format!("{} holds non-finite value {}", self.kind(), bad)));
        }
        match self {
            BoundingVolume::Region([_, south, _, north, min_h, max_h]) => {
                // west > east is legal: the region crosses the antimeridian
                if !(-FRAC_PI_2 <= *south && south <= north && *north <= FRAC_PI_2) {
                    return Err(Error::invalid(format!("region latitudes {}..{} out of order or range", south, north)));
                }
                if min_h > max_h {
                    return Err(Error::invalid(format!("region heights {}..{} inverted", min_h, max_h)));
                }
            }
            BoundingVolume::Sphere([.., radius]) if *radius < 0.0 => {
                return Err(Error::invalid(format!("sphere radius {} is negative", radius)));
            }
            _ => {}
        }
        Ok(())
    }
}

impl TryFrom<RawBoundingVolume> for BoundingVolume {
    type Error = Error;

    fn try_from(raw: RawBoundingVolume) -> Result<Self> {
        let volume = match (raw.region, raw.box_, raw.sphere) {
            (Some(v), None, None) => BoundingVolume::Region(fixed("region", v)?),
            (None, Some(v), None) => BoundingVolume::Box(fixed("box", v)?),
            (None, None, Some(v)) => BoundingVolume::Sphere(fixed("sphere", v)?),
            (None, None, None) => {
                return Err(Error::invalid("bounding volume declares no region, box or sphere"));
            }
            (region, box_, sphere) => {
                let kinds: Vec<&str> = [("region", region.is_some()), ("box", box_.is_some()), ("sphere", sphere.is_some())]
                    .into_iter()
                    .filter_map(|(k, present)| present.then_some(k))
                    .collect();
                return Err(Error::invalid(format!(
                    "bounding volume declares {} kinds at once ({})",
                    kinds.len(),
                    kinds.join(", ")
                )));
            }
        };
        volume.validate()?;
        Ok(volume)
    }
}

impl From<BoundingVolume> for RawBoundingVolume {
    fn from(volume: BoundingVolume) -> Self {
        match volume {
            BoundingVolume::Region(v) => RawBoundingVolume { region: Some(v.to_vec()), ..Default::default() },
            BoundingVolume::Box(v) => RawBoundingVolume { box_: Some(v.to_vec()), ..Default::default() },
            BoundingVolume::Sphere(v) => RawBoundingVolume { sphere: Some(v.to_vec()), ..Default::default() },
        }
    }
}
