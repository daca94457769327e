//! Route segment matching
//!
//! Selects the features of a [`RouteNetwork`] that touch the start or the end of a trip, for
//! display as a highlighted "traveled path" over the full network.

use crate::geojson::FeatureCollection;
use crate::{Coordinate, LineFeature, OverlayError, Result, RouteNetwork, utils};
use rayon::prelude::*;
use std::sync::Arc;

/// How the proximity tolerance of a match is chosen
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MatchTolerance {
    /// Tolerance equals the great-circle distance between start and end.
    ///
    /// Long trips therefore match loosely and short hops tightly. When start and end coincide
    /// the tolerance is zero and nothing but exact vertex pairs can match.
    #[default]
    TripDistance,
    /// Fixed tolerance in kilometers
    Fixed { km: f64 },
}

impl MatchTolerance {
    /// Fixed tolerance of [`utils::DEFAULT_CLOSE_THRESHOLD_KM`]
    pub const fn fixed_default() -> Self {
        Self::Fixed {
            km: utils::DEFAULT_CLOSE_THRESHOLD_KM,
        }
    }
}

/// Configuration for the matcher
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Proximity tolerance rule (default: trip distance)
    pub tolerance: MatchTolerance,
    /// Networks with at least this many features are scanned in parallel.
    /// The result is identical to a sequential scan.
    pub parallel_min_features: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            tolerance: MatchTolerance::default(),
            parallel_min_features: 4096,
        }
    }
}

/// Result of a match: the anchor feature at `start` followed by the matched network features
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedRoute {
    features: Vec<Arc<LineFeature>>,
    start: Coordinate,
    end: Coordinate,
    threshold_km: f64,
}

impl MatchedRoute {
    /// All features, the single-point anchor at `start` first
    #[inline]
    pub fn features(&self) -> &[Arc<LineFeature>] {
        &self.features
    }

    /// The synthetic single-point feature at `start`
    #[inline]
    pub fn anchor(&self) -> &LineFeature {
        &self.features[0]
    }

    /// Network features selected by the match, in network order
    #[inline]
    pub fn matched_features(&self) -> &[Arc<LineFeature>] {
        &self.features[1..]
    }

    /// `true` when no network feature matched
    #[inline]
    pub fn is_anchor_only(&self) -> bool {
        self.features.len() == 1
    }

    #[inline]
    pub fn start(&self) -> Coordinate {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Coordinate {
        self.end
    }

    /// Tolerance in kilometers used to produce this match
    #[inline]
    pub fn threshold_km(&self) -> f64 {
        self.threshold_km
    }

    /// Where the start and end markers go
    #[inline]
    pub fn marker_positions(&self) -> [Coordinate; 2] {
        [self.start, self.end]
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection::new(self.features.iter().map(|f| f.to_feature()).collect())
    }

    pub fn to_geojson_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_feature_collection())?)
    }
}

/// Extracts the part of a route network traveled between two points
#[derive(Debug, Clone, Default)]
pub struct RouteSegmentMatcher {
    config: MatcherConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteSegmentMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Tolerance in kilometers for a trip from `start` to `end`
    pub fn threshold_km(&self, start: Coordinate, end: Coordinate) -> f64 {
        match self.config.tolerance {
            MatchTolerance::TripDistance => utils::haversine_distance_km(start, end),
            MatchTolerance::Fixed { km } => km,
        }
    }

    /// Select the network features connecting `start` to `end`
    ///
    /// A feature is selected when one of its consecutive vertex pairs lies entirely within the
    /// tolerance of `start`, or entirely within the tolerance of `end`. The first qualifying pair
    /// decides; the rest of the feature is not scanned.
    ///
    /// # Errors
    /// [`OverlayError::InvalidInput`] if the network is empty or an endpoint is out of range.
    pub fn match_route(
        &self,
        network: &RouteNetwork,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<MatchedRoute> {
        #[cfg(feature = "profiling")]
        profiling::scope!("matcher::match_route");

        if network.is_empty() {
            return Err(OverlayError::InvalidInput(
                "route network is empty".to_string(),
            ));
        }
        let start = start.validated()?;
        let end = end.validated()?;

        let threshold_km = self.threshold_km(start, end);
        let connects = |feature: &Arc<LineFeature>| {
            Self::feature_connects(feature, start, end, threshold_km)
        };

        let mut features = vec![Arc::new(LineFeature::single_point(start))];
        if network.feature_count() >= self.config.parallel_min_features {
            let matched: Vec<Arc<LineFeature>> = network
                .features()
                .par_iter()
                .filter(|f| connects(f))
                .cloned()
                .collect();
            features.extend(matched);
        } else {
            features.extend(network.features().iter().filter(|f| connects(f)).cloned());
        }

        tracing::debug!(
            "Matched {} of {} features between {start} and {end} (threshold {threshold_km:.3} km)",
            features.len() - 1,
            network.feature_count()
        );

        Ok(MatchedRoute {
            features,
            start,
            end,
            threshold_km,
        })
    }

    fn feature_connects(
        feature: &LineFeature,
        start: Coordinate,
        end: Coordinate,
        threshold_km: f64,
    ) -> bool {
        let close = |a, b| utils::are_coords_close(a, b, threshold_km);
        feature.coordinates().windows(2).any(|pair| {
            let (segment_start, segment_end) = (pair[0], pair[1]);
            (close(segment_start, start) && close(segment_end, start))
                || (close(segment_start, end) && close(segment_end, end))
        })
    }
}

/// Match with the default configuration
pub fn match_route(
    network: &RouteNetwork,
    start: Coordinate,
    end: Coordinate,
) -> Result<MatchedRoute> {
    RouteSegmentMatcher::default().match_route(network, start, end)
}
