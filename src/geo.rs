//! Great-circle distance
//!
//! Haversine distance between two points given in decimal degrees.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Haversine distance in km. Assumes finite inputs.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const JOHANNESBURG: Coordinates = Coordinates { lat: -26.2041, lng: 28.0473 };
    const PRETORIA: Coordinates = Coordinates { lat: -25.7479, lng: 28.2293 };
    const CAPE_TOWN: Coordinates = Coordinates { lat: -33.9249, lng: 18.4241 };

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(JOHANNESBURG.distance_km(&JOHANNESBURG), 0.0);
        assert_eq!(haversine_km(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let there = JOHANNESBURG.distance_km(&CAPE_TOWN);
        let back = CAPE_TOWN.distance_km(&JOHANNESBURG);
        assert_relative_eq!(there, back, epsilon = 1e-9);
    }

    #[test]
    fn test_known_distances() {
        // Joburg to Pretoria is roughly 54 km as the crow flies
        let d = JOHANNESBURG.distance_km(&PRETORIA);
        assert_relative_eq!(d, 53.8, epsilon = 1.0);

        // One degree of latitude along a meridian
        let one_degree = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert_relative_eq!(one_degree, 111.195, epsilon = 0.01);
    }

    #[test]
    fn test_antipodal_points() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_KM, epsilon = 1e-6);
    }
}
