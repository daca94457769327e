//! Hand-off of route networks and matches to a map renderer
//!
//! The map library itself is abstracted behind [`MapRenderer`]. This module decides which
//! sources, line layers and markers to create, replace or move; the renderer draws them.

use crate::{
    Coordinate, MatchedRoute, OverlayError, Result, RouteNetwork, RouteSegmentMatcher,
};
use serde_json::{Value, json};

/// Identifier of a marker created by a [`MapRenderer`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Failures reported by a renderer or a 3D scene loader
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("Unknown marker: {0:?}")]
    UnknownMarker(MarkerId),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// The subset of a map library used by the overlay
pub trait MapRenderer {
    fn has_source(&self, id: &str) -> bool;
    fn add_geojson_source(&mut self, id: &str, data: Value) -> std::result::Result<(), RenderError>;
    fn remove_source(&mut self, id: &str) -> std::result::Result<(), RenderError>;

    fn add_line_layer(&mut self, layer: &LineLayer) -> std::result::Result<(), RenderError>;
    fn remove_layer(&mut self, id: &str) -> std::result::Result<(), RenderError>;
    /// Layer ids from bottom to top
    fn layer_ids(&self) -> Vec<String>;
    /// Move `id` directly below `before_id`
    fn move_layer_before(&mut self, id: &str, before_id: &str)
    -> std::result::Result<(), RenderError>;
    fn set_layout_property(
        &mut self,
        layer_id: &str,
        name: &str,
        value: Value,
    ) -> std::result::Result<(), RenderError>;

    fn add_marker(
        &mut self,
        position: Coordinate,
        color: &str,
    ) -> std::result::Result<MarkerId, RenderError>;
    fn set_marker_position(
        &mut self,
        marker: MarkerId,
        position: Coordinate,
    ) -> std::result::Result<(), RenderError>;
    fn remove_marker(&mut self, marker: MarkerId) -> std::result::Result<(), RenderError>;

    fn set_terrain_exaggeration(&mut self, exaggeration: f64)
    -> std::result::Result<(), RenderError>;
    /// Switch the base map style
    fn set_style(&mut self, name: &str) -> std::result::Result<(), RenderError>;
}

/// Line width rule
#[derive(Clone, Debug, PartialEq)]
pub enum LineWidth {
    /// Constant width in pixels
    Fixed(f64),
    /// Exponential interpolation between `(zoom, width)` stops
    ZoomExponential { base: f64, stops: Vec<(f64, f64)> },
}

impl LineWidth {
    /// Map style expression for this width
    pub fn to_style_value(&self) -> Value {
        match self {
            LineWidth::Fixed(width) => json!(width),
            LineWidth::ZoomExponential { base, stops } => {
                let mut expression = vec![
                    json!("interpolate"),
                    json!(["exponential", base]),
                    json!(["zoom"]),
                ];
                for (zoom, width) in stops {
                    expression.push(json!(zoom));
                    expression.push(json!(width));
                }
                Value::Array(expression)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Round,
    Bevel,
    Miter,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Round,
    Butt,
    Square,
}

impl LineJoin {
    fn as_str(&self) -> &'static str {
        match self {
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
            LineJoin::Miter => "miter",
        }
    }
}

impl LineCap {
    fn as_str(&self) -> &'static str {
        match self {
            LineCap::Round => "round",
            LineCap::Butt => "butt",
            LineCap::Square => "square",
        }
    }
}

/// Appearance of a line layer
#[derive(Clone, Debug, PartialEq)]
pub struct LineLayerStyle {
    pub color: String,
    pub width: LineWidth,
    pub join: LineJoin,
    pub cap: LineCap,
}

impl LineLayerStyle {
    /// Width growing from 1 px at zoom 0 to 4 px at zoom 22
    pub fn zoom_scaled_width() -> LineWidth {
        LineWidth::ZoomExponential {
            base: 1.5,
            stops: vec![(0.0, 1.0), (22.0, 4.0)],
        }
    }

    /// White background network
    pub fn network() -> Self {
        Self {
            color: "#ffffff".to_string(),
            width: Self::zoom_scaled_width(),
            join: LineJoin::Round,
            cap: LineCap::Round,
        }
    }

    /// Red traveled path
    pub fn traveled() -> Self {
        Self {
            color: "#ff0000".to_string(),
            ..Self::network()
        }
    }

    pub fn layout(&self) -> Value {
        json!({
            "line-join": self.join.as_str(),
            "line-cap": self.cap.as_str(),
        })
    }

    pub fn paint(&self) -> Value {
        json!({
            "line-color": self.color,
            "line-width": self.width.to_style_value(),
        })
    }
}

/// A line layer drawing a GeoJSON source
#[derive(Clone, Debug, PartialEq)]
pub struct LineLayer {
    pub id: String,
    pub source: String,
    pub style: LineLayerStyle,
}

impl LineLayer {
    /// Full map style layer definition
    pub fn to_style_value(&self) -> Value {
        json!({
            "id": self.id,
            "type": "line",
            "source": self.source,
            "layout": self.style.layout(),
            "paint": self.style.paint(),
        })
    }
}

/// Start and end markers of a displayed trip, owned by the caller
///
/// Pass the handle back to [`RouteOverlay::place_endpoint_markers`] to move the markers instead
/// of creating new ones.
#[derive(Debug, PartialEq, Eq)]
pub struct MarkerHandle {
    start: MarkerId,
    end: MarkerId,
}

impl MarkerHandle {
    #[inline]
    pub fn start(&self) -> MarkerId {
        self.start
    }

    #[inline]
    pub fn end(&self) -> MarkerId {
        self.end
    }

    /// Remove both markers from the renderer
    pub fn remove<R: MapRenderer + ?Sized>(self, renderer: &mut R) -> Result<()> {
        renderer.remove_marker(self.start)?;
        renderer.remove_marker(self.end)?;
        Ok(())
    }
}

/// Places a route network and traveled paths on a map
#[derive(Clone, Debug)]
pub struct RouteOverlay {
    /// Source and layer id of the full network
    pub network_id: String,
    /// Source and layer id of the traveled path
    pub traveled_id: String,
    pub network_style: LineLayerStyle,
    pub traveled_style: LineLayerStyle,
    pub start_marker_color: String,
    pub end_marker_color: String,
    matcher: RouteSegmentMatcher,
}

impl Default for RouteOverlay {
    fn default() -> Self {
        Self {
            network_id: "route".to_string(),
            traveled_id: "additionalRoute".to_string(),
            network_style: LineLayerStyle::network(),
            traveled_style: LineLayerStyle::traveled(),
            start_marker_color: "#D8D4D5".to_string(),
            end_marker_color: "#0769C5".to_string(),
            matcher: RouteSegmentMatcher::default(),
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific matcher for [`RouteOverlay::show_route`]
    pub fn with_matcher(mut self, matcher: RouteSegmentMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    #[inline]
    pub fn matcher(&self) -> &RouteSegmentMatcher {
        &self.matcher
    }

    /// Draw the whole network, replacing a previous one, below the first label layer
    pub fn install_network<R: MapRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        network: &RouteNetwork,
    ) -> Result<()> {
        let data = serde_json::to_value(network.to_feature_collection())?;
        Self::replace_line_source(
            renderer,
            &self.network_id,
            data,
            self.network_style.clone(),
        )?;

        let label_layer = renderer
            .layer_ids()
            .into_iter()
            .find(|id| id.contains("label") && *id != self.network_id);
        if let Some(label_layer) = label_layer {
            renderer.move_layer_before(&self.network_id, &label_layer)?;
        }
        Ok(())
    }

    /// Draw a traveled path, replacing a previous one
    pub fn install_matched<R: MapRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        matched: &MatchedRoute,
    ) -> Result<()> {
        Self::replace_line_source(
            renderer,
            &self.traveled_id,
            matched.to_geojson_value()?,
            self.traveled_style.clone(),
        )
    }

    /// Draw the network and, when endpoints are given, the traveled path between them
    pub fn show_route<R: MapRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        network: &RouteNetwork,
        endpoints: Option<(Coordinate, Coordinate)>,
    ) -> Result<Option<MatchedRoute>> {
        self.install_network(renderer, network)?;

        let Some((start, end)) = endpoints else {
            return Ok(None);
        };
        let matched = self.matcher.match_route(network, start, end)?;
        self.install_matched(renderer, &matched)?;
        Ok(Some(matched))
    }

    /// Put the start and end markers of `matched` on the map
    ///
    /// With a `previous` handle the existing markers are moved; otherwise new ones are created.
    pub fn place_endpoint_markers<R: MapRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        previous: Option<MarkerHandle>,
        matched: &MatchedRoute,
    ) -> Result<MarkerHandle> {
        let [start, end] = matched.marker_positions();
        match previous {
            Some(handle) => {
                renderer.set_marker_position(handle.start, start)?;
                renderer.set_marker_position(handle.end, end)?;
                Ok(handle)
            }
            None => {
                let start_marker = renderer.add_marker(start, &self.start_marker_color)?;
                let end_marker = match renderer.add_marker(end, &self.end_marker_color) {
                    Ok(marker) => marker,
                    Err(err) => {
                        // Do not leak the first marker
                        if let Err(cleanup) = renderer.remove_marker(start_marker) {
                            tracing::warn!(
                                "Failed to remove start marker {start_marker:?} after error: {cleanup}"
                            );
                        }
                        return Err(OverlayError::Render(err));
                    }
                };
                Ok(MarkerHandle {
                    start: start_marker,
                    end: end_marker,
                })
            }
        }
    }

    fn replace_line_source<R: MapRenderer + ?Sized>(
        renderer: &mut R,
        id: &str,
        data: Value,
        style: LineLayerStyle,
    ) -> Result<()> {
        if renderer.has_source(id) {
            tracing::debug!("Replacing existing source {id}");
            renderer.remove_layer(id)?;
            renderer.remove_source(id)?;
        }
        renderer.add_geojson_source(id, data)?;
        renderer.add_line_layer(&LineLayer {
            id: id.to_string(),
            source: id.to_string(),
            style,
        })?;
        Ok(())
    }
}
