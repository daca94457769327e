//! Route Overlay Library - Traveled-Path Extraction for Map Overlays
//!
//! This library loads a static route network (a GeoJSON collection of line strings) and, for a
//! pair of endpoints, extracts the line features that connect them so they can be highlighted on
//! top of the full network by a map renderer.
//!
//! # Architecture
//!
//! - **[`Coordinate`]**: WGS84 `(longitude, latitude)` value with range validation
//! - **[`RouteNetwork`]**: Immutable, shareable set of [`LineFeature`]s loaded once from GeoJSON
//! - **[`RouteSegmentMatcher`]**: Haversine proximity matching producing a [`MatchedRoute`]
//! - **[`overlay`]**: Hand-off of networks, matches and endpoint markers to a [`MapRenderer`]
//! - **[`view`]**: One parameterized map view configuration and the injected [`Scene3DLoader`]
//!
//! # Performance Characteristics
//!
//! - **Load Time**: O(F) feature decoding, parallelized across features
//! - **Match Time**: O(F × V) where F=features, V=vertices per feature, optionally parallel
//! - **Memory**: O(N) for the network; matches share features through `Arc`

mod coordinate;
pub mod geojson;
mod matcher;
mod network;
pub mod overlay;
pub mod utils;
pub mod view;

// Public API exports
pub use coordinate::Coordinate;
pub use matcher::{MatchTolerance, MatchedRoute, MatcherConfig, RouteSegmentMatcher, match_route};
pub use network::{LineFeature, RouteNetwork};
pub use overlay::{MapRenderer, MarkerHandle, RenderError, RouteOverlay};
pub use view::{MapViewConfig, Scene3DLoader};

/// Error types for the route overlay library
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Renderer error: {0}")]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
