//! Coordinate type and geo math.
//!
//! Distances are great-circle (haversine) over a spherical Earth, which is
//! plenty for city-scale vehicle tracking.  ETA is a linear estimate from an
//! assumed constant speed.
//!
use serde::{Deserialize, Serialize};

/// Mean Earth radius, in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average vehicle speed when none is configured, in km/h
pub const DEFAULT_SPEED_KMH: f64 = 30.0;

/// A geographic position, decimal degrees.
///
/// Immutable value type.  The math below is total for any finite pair of
/// coordinates; range validation is the caller's business, `is_valid()` is
/// there for feed consumers that want to check input.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Coordinate {
    /// Latitude, [-90, 90]
    pub lat: f64,
    /// Longitude, [-180, 180]
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinate { lat, lon }
    }

    /// Whether both components are inside the usual geographic ranges.
    ///
    pub fn is_valid(&self) -> bool {
        (-90. ..=90.).contains(&self.lat) && (-180. ..=180.).contains(&self.lon)
    }

    /// Great-circle distance to `other` in kilometers, haversine formula.
    ///
    /// Symmetric, returns 0 for identical points, never NaN for finite input.
    ///
    pub fn haversine_distance(&self, other: &Coordinate) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_lon / 2.0).sin()
                * (d_lon / 2.0).sin();

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Linear ETA estimate in minutes for `distance_km` at `speed_km_h`.
///
/// `speed_km_h` must be positive; the configuration layer rejects anything
/// else at session construction, so a division by zero can not be reached
/// through a constructed session.
///
pub fn eta_minutes(distance_km: f64, speed_km_h: f64) -> f64 {
    (distance_km / speed_km_h) * 60.0
}
