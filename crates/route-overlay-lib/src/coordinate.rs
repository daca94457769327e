//! WGS84 coordinate value type

use crate::{OverlayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum absolute latitude in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// Maximum absolute longitude in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// A geographic position in degrees, longitude first (GeoJSON order)
///
/// On the wire this is a GeoJSON position `[lon, lat]`. An altitude element, if present, is
/// discarded when decoding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coordinate {
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
}

impl Coordinate {
    /// Create a coordinate without range checks
    #[inline]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Create a coordinate, failing if it is outside the valid geographic range
    pub fn try_new(lon: f64, lat: f64) -> Result<Self> {
        Self::new(lon, lat).validated()
    }

    /// Check that both components are finite and within range
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && self.lon.abs() <= MAX_LONGITUDE
            && self.lat.abs() <= MAX_LATITUDE
    }

    /// Return `self` if valid, otherwise an [`OverlayError::InvalidInput`]
    pub fn validated(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(OverlayError::InvalidInput(format!(
                "coordinate out of range: {self} (expected |lon| <= {MAX_LONGITUDE}, |lat| <= {MAX_LATITUDE})"
            )))
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lon, self.lat)
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = String;

    fn try_from(position: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        match position.as_slice() {
            [lon, lat, ..] => Ok(Self::new(*lon, *lat)),
            _ => Err(format!(
                "position needs at least 2 elements, got {}",
                position.len()
            )),
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.lon, coord.lat]
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self::new(lon, lat)
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(coord: Coordinate) -> Self {
        geo::Coord {
            x: coord.lon,
            y: coord.lat,
        }
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(coord: Coordinate) -> Self {
        geo::Point::new(coord.lon, coord.lat)
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.x, coord.y)
    }
}
