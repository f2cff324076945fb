//! East-north-up local frames

use glam::{DMat4, DVec3, DVec4};

use crate::core::{Error, Result};
use super::ellipsoid::Ellipsoid;

/// Local-to-global affine transform anchored at a geodetic origin.
///
/// Columns are east, north, up (each times the uniform scale) and the
/// cartesian origin. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    matrix: DMat4,
    height: f64,
    scale: f64,
}

impl Frame {
    /// The 4x4 matrix, column-major
    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Column-major array, as written into a tile `transform`
    pub fn to_cols_array(&self) -> [f64; 16] {
        self.matrix.to_cols_array()
    }

    /// Height of the frame origin above the ellipsoid surface
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Uniform scale factor of the upper-left 3x3 block, as composed
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Frame origin in global (ECEF) coordinates
    pub fn origin(&self) -> DVec3 {
        self.matrix.w_axis.truncate()
    }

    pub fn east(&self) -> DVec3 {
        self.matrix.x_axis.truncate().normalize()
    }

    pub fn north(&self) -> DVec3 {
        self.matrix.y_axis.truncate().normalize()
    }

    pub fn up(&self) -> DVec3 {
        self.matrix.z_axis.truncate().normalize()
    }

    /// Map a point from local frame coordinates to global coordinates
    pub fn local_to_global(&self, local: DVec3) -> DVec3 {
        self.matrix.transform_point3(local)
    }

    /// Map a point from global coordinates into this frame
    pub fn global_to_local(&self, global: DVec3) -> DVec3 {
        self.matrix.inverse().transform_point3(global)
    }
}

/// Build an east-north-up frame on the WGS84 ellipsoid.
///
/// Longitude outside [-180, 180] is wrapped; latitude outside [-90, 90]
/// and non-finite input are rejected.
pub fn build_frame(longitude_deg: f64, latitude_deg: f64, height_above_origin: f64) -> Result<Frame> {
    build_frame_on(&Ellipsoid::WGS84, longitude_deg, latitude_deg, height_above_origin)
}

/// Build an east-north-up frame on an arbitrary ellipsoid
pub fn build_frame_on(
    ellipsoid: &Ellipsoid,
    longitude_deg: f64,
    latitude_deg: f64,
    height_above_origin: f64,
) -> Result<Frame> {
    if !longitude_deg.is_finite() || !latitude_deg.is_finite() || !height_above_origin.is_finite() {
        return Err(Error::invalid(format!(
            "geodetic origin must be finite (lon {}, lat {}, height {})",
            longitude_deg, latitude_deg, height_above_origin
        )));
    }
    if !(-90.0..=90.0).contains(&latitude_deg) {
        return Err(Error::invalid(format!(
            "latitude {} outside [-90, 90]",
            latitude_deg
        )));
    }

    let longitude = wrap_longitude(longitude_deg).to_radians();
    let latitude = latitude_deg.to_radians();

    let origin = ellipsoid.cartographic_to_cartesian(longitude, latitude, height_above_origin);
    let up = ellipsoid.geodetic_surface_normal(longitude, latitude);
    let east = DVec3::new(-longitude.sin(), longitude.cos(), 0.0);
    let north = up.cross(east);

    Ok(Frame {
        matrix: DMat4::from_cols(
            east.extend(0.0),
            north.extend(0.0),
            up.extend(0.0),
            DVec4::new(origin.x, origin.y, origin.z, 1.0),
        ),
        height: height_above_origin,
        scale: 1.0,
    })
}

/// Right-multiply a uniform scale onto a frame.
///
/// Local coordinates are scaled before the frame maps them to global
/// coordinates; the origin is unchanged.
pub fn compose_scale(frame: &Frame, scale_factor: f64) -> Result<Frame> {
    if !scale_factor.is_finite() || scale_factor <= 0.0 {
        return Err(Error::invalid(format!(
            "scale factor must be finite and positive, got {}",
            scale_factor
        )));
    }
    Ok(Frame {
        matrix: frame.matrix * DMat4::from_scale(DVec3::splat(scale_factor)),
        height: frame.height,
        scale: frame.scale * scale_factor,
    })
}

/// Wrap a longitude in degrees into [-180, 180]
fn wrap_longitude(longitude_deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude_deg) {
        longitude_deg
    } else {
        (longitude_deg + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LON: f64 = -75.61200;
    const LAT: f64 = 40.04255;

    fn assert_close(a: DVec3, b: DVec3, eps: f64) {
        assert!((a - b).length() < eps, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let frame = build_frame(LON, LAT, 0.0).unwrap();
        let (e, n, u) = (frame.east(), frame.north(), frame.up());

        assert!((e.length() - 1.0).abs() < 1e-12);
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert!((u.length() - 1.0).abs() < 1e-12);
        assert!(e.dot(n).abs() < 1e-12);
        assert!(e.dot(u).abs() < 1e-12);
        assert!(n.dot(u).abs() < 1e-12);
        // right-handed
        assert_close(e.cross(n), u, 1e-12);
        assert!((frame.scale() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_equator_frame() {
        let frame = build_frame(0.0, 0.0, 0.0).unwrap();
        assert_close(frame.east(), DVec3::Y, 1e-12);
        assert_close(frame.north(), DVec3::Z, 1e-12);
        assert_close(frame.up(), DVec3::X, 1e-12);
        assert_close(frame.origin(), DVec3::new(6378137.0, 0.0, 0.0), 1e-6);
    }

    #[test]
    fn test_height_offsets_along_up() {
        let ground = build_frame(LON, LAT, 0.0).unwrap();
        let raised = build_frame(LON, LAT, 503.75).unwrap();
        assert_close(raised.origin() - ground.origin(), ground.up() * 503.75, 1e-6);
        assert_eq!(raised.height(), 503.75);
    }

    #[test]
    fn test_local_to_global() {
        let frame = build_frame(LON, LAT, 0.0).unwrap();
        let p = frame.local_to_global(DVec3::new(10.0, 0.0, 0.0));
        assert_close(p, frame.origin() + frame.east() * 10.0, 1e-6);
    }

    #[test]
    fn test_global_to_local_between_frames() {
        let ground = build_frame(LON, LAT, 0.0).unwrap();
        let raised = build_frame(LON, LAT, 10.0).unwrap();
        let p = DVec3::new(3.0, -4.0, 0.0);

        assert_close(ground.global_to_local(ground.local_to_global(p)), p, 1e-6);
        // a point on the raised frame's plane sits 10 m up in the ground frame
        assert_close(ground.global_to_local(raised.local_to_global(p)), p + DVec3::Z * 10.0, 1e-6);
    }

    #[test]
    fn test_invalid_latitude_rejected() {
        assert!(matches!(build_frame(0.0, 90.5, 0.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(build_frame(0.0, -91.0, 0.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(build_frame(f64::NAN, 0.0, 0.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(build_frame(0.0, 0.0, f64::INFINITY), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_poles_accepted() {
        let frame = build_frame(30.0, 90.0, 0.0).unwrap();
        assert_close(frame.up(), DVec3::Z, 1e-12);
        assert!(frame.east().dot(frame.north()).abs() < 1e-12);
    }

    #[test]
    fn test_longitude_wraps() {
        let wrapped = build_frame(190.0, 10.0, 0.0).unwrap();
        let direct = build_frame(-170.0, 10.0, 0.0).unwrap();
        assert_close(wrapped.origin(), direct.origin(), 1e-6);
        assert_close(wrapped.east(), direct.east(), 1e-12);
    }

    #[test]
    fn test_compose_scale() {
        let frame = build_frame(LON, LAT, 10.0).unwrap();
        let scaled = compose_scale(&frame, 100.0).unwrap();

        assert_eq!(scaled.scale(), 100.0);
        assert!((scaled.matrix().x_axis.truncate().length() - 100.0).abs() < 1e-9);
        assert_close(scaled.origin(), frame.origin(), 1e-9);
        assert_close(scaled.east(), frame.east(), 1e-12);
        assert_eq!(scaled.height(), 10.0);

        let p = scaled.local_to_global(DVec3::new(0.0, 0.0, 1.0));
        assert_close(p, frame.origin() + frame.up() * 100.0, 1e-6);
    }

    #[test]
    fn test_compose_scale_rejects_non_positive() {
        let frame = build_frame(LON, LAT, 0.0).unwrap();
        assert!(matches!(compose_scale(&frame, 0.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(compose_scale(&frame, -2.0), Err(Error::InvalidArgument(_))));
    }
}
