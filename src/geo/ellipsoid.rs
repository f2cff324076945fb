//! Reference ellipsoid

use glam::DVec3;

/// Triaxial reference ellipsoid (only oblate spheroids are used in practice)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    pub radii: DVec3,
}

impl Ellipsoid {
    /// WGS84 ellipsoid
    pub const WGS84: Ellipsoid = Ellipsoid {
        radii: DVec3::new(6378137.0, 6378137.0, 6356752.314245179),
    };

    pub fn radii_squared(&self) -> DVec3 {
        self.radii * self.radii
    }

    /// Unit normal to the surface at a geodetic position (radians).
    ///
    /// This is the local "up" direction: +z at the north pole, +x at
    /// (0°, 0°), +y at (90°E, 0°).
    pub fn geodetic_surface_normal(&self, longitude: f64, latitude: f64) -> DVec3 {
        let cos_lat = latitude.cos();
        DVec3::new(
            cos_lat * longitude.cos(),
            cos_lat * longitude.sin(),
            latitude.sin(),
        )
        .normalize()
    }

    /// Convert geodetic coordinates (radians, meters) to Earth-centered
    /// Earth-fixed cartesian coordinates.
    pub fn cartographic_to_cartesian(&self, longitude: f64, latitude: f64, height: f64) -> DVec3 {
        let n = self.geodetic_surface_normal(longitude, latitude);
        let k = self.radii_squared() * n;
        let gamma = n.dot(k).sqrt();
        k / gamma + n * height
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
