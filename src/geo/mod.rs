//! Geodetic reference frames
//!
//! Converts a geodetic origin into local east-north-up frames and derives
//! the geographic extent of a square tile footprint around that origin.

pub mod ellipsoid;
pub mod frame;
pub mod region;

pub use ellipsoid::Ellipsoid;
pub use frame::{Frame, build_frame, compose_scale};
pub use region::{meters_to_latitude, meters_to_longitude, tile_region};
