//! Utility functions for great-circle distances between coordinates

use crate::Coordinate;

/// Earth's mean radius in kilometers used by all distance computations
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Proximity tolerance in kilometers used when no explicit threshold is given
pub const DEFAULT_CLOSE_THRESHOLD_KM: f64 = 5.0;

/// Calculate the Haversine distance between two coordinates in kilometers
///
/// Symmetric in its arguments and exactly `0.0` for identical coordinates.
#[inline]
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `h` past 1 for near-antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Check whether two coordinates are within `threshold_km` of each other (inclusive)
#[inline(always)]
pub fn are_coords_close(a: Coordinate, b: Coordinate, threshold_km: f64) -> bool {
    haversine_distance_km(a, b) <= threshold_km
}

/// Total length of a polyline in kilometers
pub fn polyline_length_km(coordinates: &[Coordinate]) -> f64 {
    coordinates
        .windows(2)
        .map(|pair| haversine_distance_km(pair[0], pair[1]))
        .sum()
}
