//! Geographic extent of a tile footprint

use crate::core::{Error, Result};

/// Approximate radians of longitude spanned by one meter at the equator
const RADIANS_PER_METER_LONGITUDE: f64 = 0.000000156785;
/// Approximate radians of latitude spanned by one meter
const RADIANS_PER_METER_LATITUDE: f64 = 0.000000157891;

/// Radians of longitude covered by `meters` at `latitude` (radians)
pub fn meters_to_longitude(meters: f64, latitude: f64) -> f64 {
    meters * RADIANS_PER_METER_LONGITUDE / latitude.cos()
}

/// Radians of latitude covered by `meters`
pub fn meters_to_latitude(meters: f64) -> f64 {
    meters * RADIANS_PER_METER_LATITUDE
}

/// Region `[west, south, east, north, min_height, max_height]` (radians,
/// meters) of a square footprint `tile_width` wide centered on the origin.
pub fn tile_region(
    longitude_deg: f64,
    latitude_deg: f64,
    tile_width: f64,
    min_height: f64,
    max_height: f64,
) -> Result<[f64; 6]> {
    if !tile_width.is_finite() || tile_width <= 0.0 {
        return Err(Error::invalid(format!("tile width must be positive, got {}", tile_width)));
    }
    if !(-90.0..90.0).contains(&latitude_deg) {
        return Err(Error::invalid(format!(
            "latitude {} has no finite longitude extent",
            latitude_deg
        )));
    }
    if !(min_height <= max_height) {
        return Err(Error::invalid(format!(
            "region heights inverted ({} > {})",
            min_height, max_height
        )));
    }

    let longitude = longitude_deg.to_radians();
    let latitude = latitude_deg.to_radians();
    let half_lon = meters_to_longitude(tile_width, latitude) / 2.0;
    let half_lat = meters_to_latitude(tile_width) / 2.0;

    Ok([
        longitude - half_lon,
        latitude - half_lat,
        longitude + half_lon,
        latitude + half_lat,
        min_height,
        max_height,
    ])
}
