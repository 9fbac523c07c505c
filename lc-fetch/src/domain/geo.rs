//! Geographic primitives for the stop-selection heuristic.
//!
//! The two measures here feed directly into candidate scoring, and their
//! exact numeric behavior is part of the crate's contract: route selection
//! was tuned against them. In particular [`directional_fit`] is a planar
//! approximation over raw coordinates, not a spherical bearing, and must
//! stay that way.

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair, longitude first (the order feeds use).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

impl GeoPoint {
    /// Create a point from longitude and latitude in degrees.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Euclidean length of the raw (longitude, latitude) vector.
    fn vector_length(&self) -> f64 {
        (self.longitude * self.longitude + self.latitude * self.latitude).sqrt()
    }
}

/// Great-circle distance between two points in kilometers (haversine).
///
/// # Examples
///
/// ```
/// use lc_fetch::domain::{GeoPoint, haversine_distance};
///
/// let brussels = GeoPoint::new(4.3517, 50.8503);
/// let ghent = GeoPoint::new(3.7174, 51.0543);
/// let d = haversine_distance(brussels, ghent);
/// assert!((d - 49.9).abs() < 0.5);
/// ```
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Directional alignment of two positions: the dot product of their raw
/// (longitude, latitude) vectors over the sum of the vector lengths.
///
/// Not a geodesic bearing. The denominator is the sum, not the product, of
/// the lengths, so equal vectors evaluate to half their length rather
/// than 1. Both quirks are load-bearing for score normalization and are
/// kept as-is.
pub fn directional_fit(a: GeoPoint, b: GeoPoint) -> f64 {
    let dot = a.longitude * b.longitude + a.latitude * b.latitude;
    let denominator = a.vector_length() + b.vector_length();
    if denominator == 0.0 {
        return 0.0;
    }
    dot / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_same_point() {
        let p = GeoPoint::new(4.3517, 50.8503);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn haversine_symmetric() {
        let a = GeoPoint::new(4.3517, 50.8503);
        let b = GeoPoint::new(3.7174, 51.0543);
        assert_eq!(haversine_distance(a, b), haversine_distance(b, a));
    }

    #[test]
    fn haversine_known_distance() {
        // Brussels to Ghent is just under 50 km as the crow flies.
        let brussels = GeoPoint::new(4.3517, 50.8503);
        let ghent = GeoPoint::new(3.7174, 51.0543);
        let d = haversine_distance(brussels, ghent);
        assert!((d - 49.9).abs() < 0.5, "got {d}");
    }

    #[test]
    fn directional_fit_symmetric() {
        let a = GeoPoint::new(4.0, 50.0);
        let b = GeoPoint::new(3.0, 51.0);
        assert_eq!(directional_fit(a, b), directional_fit(b, a));
    }

    #[test]
    fn directional_fit_equal_vectors() {
        let a = GeoPoint::new(3.0, 4.0);
        // dot = 25, lengths sum = 10, so the fit is half the length.
        assert!((directional_fit(a, a) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn directional_fit_zero_vectors() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert_eq!(directional_fit(origin, origin), 0.0);
        assert_eq!(directional_fit(origin, GeoPoint::new(1.0, 1.0)), 0.0);
    }
}
