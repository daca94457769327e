//! Route network storage and loading module
//!
//! This module provides the `RouteNetwork` struct holding the static line features of a route
//! network, decoded from GeoJSON, with precomputed statistics.

use crate::geojson::{self, DecodedFeature, Feature, Properties};
use crate::{Coordinate, OverlayError, Result, utils};
use geo::{LineString, Rect};
use rayon::prelude::*;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// One polyline of a route network
#[derive(Clone, Debug, PartialEq)]
pub struct LineFeature {
    coordinates: Vec<Coordinate>,
    properties: Option<Properties>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LineFeature {
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self {
            coordinates,
            properties: None,
        }
    }

    pub fn with_properties(coordinates: Vec<Coordinate>, properties: Properties) -> Self {
        Self {
            coordinates,
            properties: Some(properties),
        }
    }

    /// A degenerate feature made of a single position
    pub fn single_point(coordinate: Coordinate) -> Self {
        Self::new(vec![coordinate])
    }

    #[inline]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    #[inline]
    pub fn properties(&self) -> Option<&Properties> {
        self.properties.as_ref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Length of the polyline in kilometers
    pub fn length_km(&self) -> f64 {
        utils::polyline_length_km(&self.coordinates)
    }

    /// Convert to a `geo` line string (x = longitude, y = latitude)
    pub fn to_line_string(&self) -> LineString<f64> {
        self.coordinates
            .iter()
            .map(|&c| geo::Coord::from(c))
            .collect()
    }

    /// Convert to a GeoJSON feature
    pub fn to_feature(&self) -> Feature {
        Feature::line_string(self.coordinates.clone(), self.properties.clone())
    }
}

/// Cached statistics, computed once at construction
#[derive(Debug, Clone, Default)]
struct CachedStats {
    total_vertices: usize,
    total_length_km: f64,
    bounding_box: Option<Rect<f64>>,
}

/// The full, read-only route network
#[derive(Clone, Debug)]
pub struct RouteNetwork {
    features: Vec<Arc<LineFeature>>,
    skipped_features: usize,
    cached_stats: CachedStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteNetwork {
    /// Create a network from already decoded features
    pub fn new(features: Vec<LineFeature>) -> Self {
        Self::from_parts(features.into_iter().map(Arc::new).collect(), 0)
    }

    fn from_parts(features: Vec<Arc<LineFeature>>, skipped_features: usize) -> Self {
        let cached_stats = Self::compute_stats(&features);
        Self {
            features,
            skipped_features,
            cached_stats,
        }
    }

    /// Decode a parsed GeoJSON `FeatureCollection`
    ///
    /// Non-`LineString` features are ignored. Malformed features are skipped with a warning and
    /// counted in [`RouteNetwork::skipped_features`]. Only a top level that is not a feature
    /// collection is an error.
    pub fn from_geojson_value(value: &Value) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("network::from_geojson_value");

        let raw_features =
            geojson::collection_features(value).map_err(OverlayError::InvalidGeoJson)?;

        // Decode in parallel; collect keeps the input order
        let decoded: Vec<DecodedFeature> =
            raw_features.par_iter().map(geojson::decode_feature).collect();

        let mut features = Vec::with_capacity(decoded.len());
        let mut skipped = 0;
        for (index, feature) in decoded.into_iter().enumerate() {
            match feature {
                DecodedFeature::Line {
                    coordinates,
                    properties,
                } => features.push(Arc::new(LineFeature {
                    coordinates,
                    properties,
                })),
                DecodedFeature::Ignored { geometry_type } => {
                    tracing::debug!("Ignoring feature {index} with {geometry_type} geometry");
                }
                DecodedFeature::Malformed { reason } => {
                    tracing::warn!("Skipping malformed feature {index}: {reason}");
                    skipped += 1;
                }
            }
        }

        tracing::debug!(
            "Decoded route network: {} line features, {} skipped",
            features.len(),
            skipped
        );
        Ok(Self::from_parts(features, skipped))
    }

    /// Parse a GeoJSON document from a string
    pub fn from_geojson_str(geojson: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(geojson)?;
        Self::from_geojson_value(&value)
    }

    /// Parse a GeoJSON document from a reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_geojson_value(&value)
    }

    /// Load a GeoJSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("network::load_from_file");

        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let network = Self::from_reader(std::io::BufReader::new(file))?;
        tracing::info!(
            "Loaded {} line features ({} vertices) from {}",
            network.feature_count(),
            network.total_vertices(),
            path.display()
        );
        Ok(network)
    }

    fn compute_stats(features: &[Arc<LineFeature>]) -> CachedStats {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut stats = CachedStats::default();

        for feature in features {
            stats.total_vertices += feature.len();
            stats.total_length_km += feature.length_km();
            for coord in feature.coordinates() {
                min_x = min_x.min(coord.lon);
                min_y = min_y.min(coord.lat);
                max_x = max_x.max(coord.lon);
                max_y = max_y.max(coord.lat);
            }
        }

        if stats.total_vertices > 0 {
            stats.bounding_box = Some(Rect::new(
                geo::Coord { x: min_x, y: min_y },
                geo::Coord { x: max_x, y: max_y },
            ));
        }
        stats
    }

    /// All line features in input order
    #[inline]
    pub fn features(&self) -> &[Arc<LineFeature>] {
        &self.features
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Arc<LineFeature>> {
        self.features.get(index)
    }

    #[inline]
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of input features dropped because they were malformed
    #[inline]
    pub fn skipped_features(&self) -> usize {
        self.skipped_features
    }

    /// Total number of vertices across all features
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn total_vertices(&self) -> usize {
        self.cached_stats.total_vertices
    }

    /// Total length of all features in kilometers
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn total_length_km(&self) -> f64 {
        self.cached_stats.total_length_km
    }

    /// Bounding box in degrees (x = longitude, y = latitude), `None` without vertices
    #[inline]
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.cached_stats.bounding_box
    }

    /// The whole network as a GeoJSON feature collection
    pub fn to_feature_collection(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection::new(self.features.iter().map(|f| f.to_feature()).collect())
    }
}
