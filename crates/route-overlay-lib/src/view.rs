//! Map view configuration and 3D scene placement
//!
//! A single [`MapViewConfig`] describes every variant of the map screen (flat, terrain, city);
//! [`apply_view`] pushes it to a [`MapRenderer`] and a [`Scene3DLoader`].

use crate::overlay::{MapRenderer, RenderError};
use crate::{Coordinate, Result};
use serde_json::json;

/// Layer holding extruded buildings in the base style
pub const BUILDING_LAYER_ID: &str = "building-extrusion";

/// Road and tunnel layers of the base style toggled together by `show_roads`
pub const ROAD_LAYER_IDS: [&str; 9] = [
    "road-primary",
    "road-secondary-tertiary",
    "road-street",
    "road-minor",
    "road-major-link",
    "road-motorway-trunk",
    "tunnel-motorway-trunk",
    "tunnel-primary",
    "tunnel-secondary-tertiary",
];

/// Mountain height (percent) at which terrain is drawn unexaggerated
pub const NEUTRAL_MOUNTAIN_HEIGHT: u32 = 100;

/// Default map center, over Jerusalem
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(35.21633, 31.76904);

/// Base map styles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapStyle {
    #[default]
    Spring,
    SpringNight,
    SummerLight,
    Night,
    WinterDark,
}

/// Time of day of the displayed event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Night,
    Other,
}

/// Weather of the displayed event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Weather {
    #[default]
    Clear,
    Rainy,
    Snowy,
}

impl MapStyle {
    /// Style for the conditions of an event; weather takes precedence over time of day
    pub fn for_conditions(time_of_day: TimeOfDay, weather: Weather) -> Self {
        match weather {
            Weather::Rainy => MapStyle::Spring,
            Weather::Snowy => MapStyle::WinterDark,
            Weather::Clear => match time_of_day {
                TimeOfDay::Night => MapStyle::SpringNight,
                TimeOfDay::Morning => MapStyle::SummerLight,
                TimeOfDay::Other => MapStyle::Night,
            },
        }
    }

    /// Style name handed to the renderer
    pub fn name(&self) -> &'static str {
        match self {
            MapStyle::Spring => "spring",
            MapStyle::SpringNight => "spring-night",
            MapStyle::SummerLight => "summer-light",
            MapStyle::Night => "night",
            MapStyle::WinterDark => "winter-dark",
        }
    }
}

/// Terrain elevation settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainConfig {
    /// Relief height in percent of the real elevation
    pub mountain_height_percent: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            mountain_height_percent: NEUTRAL_MOUNTAIN_HEIGHT,
        }
    }
}

impl TerrainConfig {
    /// Relief used for an event of the given year (negative = BC)
    pub fn for_event_year(year: i32) -> Self {
        Self {
            mountain_height_percent: if year < 0 { 80 } else { 20 },
        }
    }

    #[inline]
    pub fn exaggeration(&self) -> f64 {
        f64::from(self.mountain_height_percent) / 100.0
    }
}

/// Rotation in degrees around each axis
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Scale factors per axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A glTF landmark placed on the map
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkModel {
    /// Model used at neutral relief
    pub model_path: String,
    /// More detailed model (e.g. with the temple), used when `detailed` is set
    pub detailed_model_path: Option<String>,
    pub detailed: bool,
    pub position: Coordinate,
    /// Rotation applied while loading the model
    pub load_rotation: Rotation,
    /// Rotation applied once the model is on the map
    pub heading: Rotation,
}

impl Default for LandmarkModel {
    fn default() -> Self {
        Self {
            model_path: "/assets/JERUSALEM.gltf".to_string(),
            detailed_model_path: Some("/assets/JERUSALEM_temple.glb".to_string()),
            detailed: false,
            position: Coordinate::new(35.2310, 31.7794),
            load_rotation: Rotation {
                x: 90.0,
                y: -90.0,
                z: 0.0,
            },
            heading: Rotation {
                x: 0.0,
                y: 0.0,
                z: 241.0,
            },
        }
    }
}

/// Everything a [`Scene3DLoader`] needs to put a model on the map
#[derive(Clone, Debug, PartialEq)]
pub struct ModelPlacement {
    pub model_path: String,
    pub position: Coordinate,
    pub scale: Scale,
    pub load_rotation: Rotation,
    pub heading: Rotation,
}

impl LandmarkModel {
    const BASE_SCALE: f64 = 10.0;
    const DEPTH_SCALE: f64 = 15.0;

    /// Placement for the given relief
    ///
    /// The model is stretched vertically so it stays visible above the terrain: ×2 when the
    /// relief is not neutral, otherwise ×4 for the detailed model and ×8 for the plain one.
    pub fn placement(&self, mountain_height_percent: u32) -> ModelPlacement {
        let use_detailed = self.detailed && self.detailed_model_path.is_some();
        let height_multiple = if mountain_height_percent != NEUTRAL_MOUNTAIN_HEIGHT {
            2.0
        } else if use_detailed {
            4.0
        } else {
            8.0
        };
        let model_path = match (&self.detailed_model_path, use_detailed) {
            (Some(path), true) => path.clone(),
            _ => self.model_path.clone(),
        };

        ModelPlacement {
            model_path,
            position: self.position,
            scale: Scale {
                x: Self::BASE_SCALE,
                y: Self::BASE_SCALE * height_multiple,
                z: Self::DEPTH_SCALE,
            },
            load_rotation: self.load_rotation,
            heading: self.heading,
        }
    }
}

/// Identifier of a model loaded into the 3D scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelId(pub u64);

/// Capability to place 3D assets on the map, injected where needed
pub trait Scene3DLoader {
    fn load_model(&mut self, placement: &ModelPlacement) -> std::result::Result<ModelId, RenderError>;
}

/// Parameters of one map screen
#[derive(Clone, Debug, PartialEq)]
pub struct MapViewConfig {
    pub center: Coordinate,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub style: MapStyle,
    pub show_buildings: bool,
    pub show_roads: bool,
    /// Whether users may add events by clicking on the map
    pub enable_event_add: bool,
    pub terrain: Option<TerrainConfig>,
    pub landmark: Option<LandmarkModel>,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self::flat_2d()
    }
}

impl MapViewConfig {
    /// Top-down map without relief
    pub fn flat_2d() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: 9.0,
            pitch: 0.0,
            bearing: 0.0,
            style: MapStyle::default(),
            show_buildings: false,
            show_roads: true,
            enable_event_add: false,
            terrain: None,
            landmark: None,
        }
    }

    /// Tilted map with relief and the landmark model
    pub fn terrain_3d() -> Self {
        Self {
            pitch: 62.0,
            bearing: -20.0,
            terrain: Some(TerrainConfig::default()),
            landmark: Some(LandmarkModel::default()),
            ..Self::flat_2d()
        }
    }

    /// Steeply tilted city view
    pub fn city_3d() -> Self {
        Self {
            pitch: 75.0,
            bearing: 0.0,
            ..Self::terrain_3d()
        }
    }

    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = center;
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }

    pub fn with_style(mut self, style: MapStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_buildings(mut self, show: bool) -> Self {
        self.show_buildings = show;
        self
    }

    pub fn with_roads(mut self, show: bool) -> Self {
        self.show_roads = show;
        self
    }

    pub fn with_event_add(mut self, enabled: bool) -> Self {
        self.enable_event_add = enabled;
        self
    }

    pub fn with_terrain(mut self, terrain: Option<TerrainConfig>) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn with_landmark(mut self, landmark: Option<LandmarkModel>) -> Self {
        self.landmark = landmark;
        self
    }

    /// Mountain height in effect, neutral without terrain
    pub fn mountain_height_percent(&self) -> u32 {
        self.terrain
            .map_or(NEUTRAL_MOUNTAIN_HEIGHT, |t| t.mountain_height_percent)
    }

    /// Check the numeric parameters
    pub fn validate(&self) -> Result<()> {
        self.center.validated()?;
        if !(0.0..=85.0).contains(&self.pitch) {
            return Err(crate::OverlayError::InvalidInput(format!(
                "pitch must be within 0..=85 degrees, got {}",
                self.pitch
            )));
        }
        if !(0.0..=24.0).contains(&self.zoom) {
            return Err(crate::OverlayError::InvalidInput(format!(
                "zoom must be within 0..=24, got {}",
                self.zoom
            )));
        }
        Ok(())
    }
}

/// Push the layer, terrain and 3D settings of `config` to the map
///
/// Returns the id of the landmark model when one was placed.
pub fn apply_view<R, L>(
    renderer: &mut R,
    loader: &mut L,
    config: &MapViewConfig,
) -> Result<Option<ModelId>>
where
    R: MapRenderer + ?Sized,
    L: Scene3DLoader + ?Sized,
{
    config.validate()?;

    renderer.set_style(config.style.name())?;

    let layer_ids = renderer.layer_ids();
    let has_layer = |id: &str| layer_ids.iter().any(|layer| layer == id);

    if has_layer(BUILDING_LAYER_ID) {
        renderer.set_layout_property(
            BUILDING_LAYER_ID,
            "visibility",
            visibility(config.show_buildings),
        )?;
    } else {
        tracing::debug!("Style has no {BUILDING_LAYER_ID} layer, skipping building visibility");
    }

    for road_layer in ROAD_LAYER_IDS.into_iter().filter(|id| has_layer(*id)) {
        renderer.set_layout_property(road_layer, "visibility", visibility(config.show_roads))?;
    }

    if let Some(terrain) = config.terrain {
        renderer.set_terrain_exaggeration(terrain.exaggeration())?;
    }

    let Some(landmark) = &config.landmark else {
        return Ok(None);
    };
    let placement = landmark.placement(config.mountain_height_percent());
    let model = loader.load_model(&placement)?;
    tracing::debug!("Placed landmark {} as {model:?}", placement.model_path);
    Ok(Some(model))
}

fn visibility(visible: bool) -> serde_json::Value {
    json!(if visible { "visible" } else { "none" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OverlayError;
    use crate::overlay::testing::RecordingRenderer;

    #[derive(Default)]
    struct RecordingLoader {
        loaded: Vec<ModelPlacement>,
    }

    impl Scene3DLoader for RecordingLoader {
        fn load_model(
            &mut self,
            placement: &ModelPlacement,
        ) -> std::result::Result<ModelId, RenderError> {
            self.loaded.push(placement.clone());
            Ok(ModelId(self.loaded.len() as u64))
        }
    }

    struct FailingLoader;

    impl Scene3DLoader for FailingLoader {
        fn load_model(&mut self, _: &ModelPlacement) -> std::result::Result<ModelId, RenderError> {
            Err(RenderError::Backend("no WebGL context".to_string()))
        }
    }

    #[test]
    fn test_presets() {
        let flat = MapViewConfig::flat_2d();
        assert_eq!(flat.pitch, 0.0);
        assert!(flat.terrain.is_none());
        assert!(flat.landmark.is_none());

        let terrain = MapViewConfig::terrain_3d();
        assert_eq!((terrain.pitch, terrain.bearing), (62.0, -20.0));
        assert!(terrain.landmark.is_some());

        let city = MapViewConfig::city_3d();
        assert_eq!((city.pitch, city.bearing), (75.0, 0.0));
        assert_eq!(city.terrain, terrain.terrain);

        assert_eq!(MapViewConfig::default(), flat);
    }

    #[test]
    fn test_builder_overrides() {
        let config = MapViewConfig::terrain_3d()
            .with_pitch(45.0)
            .with_buildings(true)
            .with_event_add(true)
            .with_style(MapStyle::WinterDark);
        assert_eq!(config.pitch, 45.0);
        assert!(config.show_buildings);
        assert!(config.enable_event_add);
        assert_eq!(config.style, MapStyle::WinterDark);
        assert_eq!(config.bearing, -20.0);
    }

    #[test]
    fn test_style_for_conditions() {
        use MapStyle::*;
        assert_eq!(MapStyle::for_conditions(TimeOfDay::Night, Weather::Clear), SpringNight);
        assert_eq!(MapStyle::for_conditions(TimeOfDay::Morning, Weather::Clear), SummerLight);
        assert_eq!(MapStyle::for_conditions(TimeOfDay::Other, Weather::Clear), Night);
        assert_eq!(MapStyle::for_conditions(TimeOfDay::Night, Weather::Rainy), Spring);
        assert_eq!(MapStyle::for_conditions(TimeOfDay::Morning, Weather::Snowy), WinterDark);
    }

    #[test]
    fn test_terrain() {
        assert_eq!(TerrainConfig::default().exaggeration(), 1.0);
        assert_eq!(TerrainConfig::for_event_year(-30).mountain_height_percent, 80);
        assert_eq!(TerrainConfig::for_event_year(33).exaggeration(), 0.2);
    }

    #[test]
    fn test_landmark_scale() {
        let plain = LandmarkModel::default();
        let detailed = LandmarkModel {
            detailed: true,
            ..LandmarkModel::default()
        };

        let placement = plain.placement(100);
        assert_eq!(placement.scale, Scale { x: 10.0, y: 80.0, z: 15.0 });
        assert_eq!(placement.model_path, "/assets/JERUSALEM.gltf");

        let placement = detailed.placement(100);
        assert_eq!(placement.scale.y, 40.0);
        assert_eq!(placement.model_path, "/assets/JERUSALEM_temple.glb");

        assert_eq!(plain.placement(80).scale.y, 20.0);
        assert_eq!(detailed.placement(150).scale.y, 20.0);
    }

    #[test]
    fn test_detailed_without_path_falls_back() {
        let landmark = LandmarkModel {
            detailed: true,
            detailed_model_path: None,
            ..LandmarkModel::default()
        };
        let placement = landmark.placement(100);
        assert_eq!(placement.model_path, "/assets/JERUSALEM.gltf");
        assert_eq!(placement.scale.y, 80.0);
    }

    #[test]
    fn test_apply_view() {
        let mut renderer = RecordingRenderer::with_base_layers(&["land", BUILDING_LAYER_ID]);
        let mut loader = RecordingLoader::default();
        let config = MapViewConfig::terrain_3d().with_terrain(Some(TerrainConfig {
            mountain_height_percent: 150,
        }));

        let model = apply_view(&mut renderer, &mut loader, &config).unwrap();

        assert_eq!(model, Some(ModelId(1)));
        assert_eq!(renderer.terrain_exaggeration, Some(1.5));
        assert_eq!(
            renderer.layout[&(BUILDING_LAYER_ID.to_string(), "visibility".to_string())],
            json!("none")
        );
        assert_eq!(loader.loaded[0].scale.y, 20.0);
        assert_eq!(loader.loaded[0].position, Coordinate::new(35.2310, 31.7794));
    }

    #[test]
    fn test_apply_flat_view_places_nothing() {
        let mut renderer = RecordingRenderer::with_base_layers(&[BUILDING_LAYER_ID]);
        let mut loader = RecordingLoader::default();

        let model = apply_view(
            &mut renderer,
            &mut loader,
            &MapViewConfig::flat_2d().with_buildings(true),
        )
        .unwrap();

        assert!(model.is_none());
        assert!(loader.loaded.is_empty());
        assert!(renderer.terrain_exaggeration.is_none());
        assert_eq!(
            renderer.layout[&(BUILDING_LAYER_ID.to_string(), "visibility".to_string())],
            json!("visible")
        );
    }

    #[test]
    fn test_apply_view_hides_roads() {
        let mut renderer = RecordingRenderer::with_base_layers(&[
            "road-primary",
            "road-street",
            "tunnel-primary",
            "road-label",
            BUILDING_LAYER_ID,
        ]);
        let mut loader = RecordingLoader::default();

        apply_view(
            &mut renderer,
            &mut loader,
            &MapViewConfig::flat_2d().with_roads(false),
        )
        .unwrap();

        for id in ["road-primary", "road-street", "tunnel-primary"] {
            assert_eq!(
                renderer.layout[&(id.to_string(), "visibility".to_string())],
                json!("none"),
                "{id}"
            );
        }
        // Labels are not part of the road toggle; missing road layers are skipped
        assert!(
            !renderer
                .layout
                .contains_key(&("road-label".to_string(), "visibility".to_string()))
        );
        assert_eq!(renderer.layout.len(), 4);
    }

    #[test]
    fn test_apply_view_shows_roads() {
        let mut renderer = RecordingRenderer::with_base_layers(&["road-minor"]);
        let mut loader = RecordingLoader::default();

        apply_view(&mut renderer, &mut loader, &MapViewConfig::flat_2d()).unwrap();

        assert_eq!(
            renderer.layout[&("road-minor".to_string(), "visibility".to_string())],
            json!("visible")
        );
    }

    #[test]
    fn test_apply_view_sets_style() {
        let mut renderer = RecordingRenderer::default();
        let mut loader = RecordingLoader::default();

        let config = MapViewConfig::flat_2d()
            .with_style(MapStyle::for_conditions(TimeOfDay::Morning, Weather::Snowy));
        apply_view(&mut renderer, &mut loader, &config).unwrap();

        assert_eq!(renderer.style.as_deref(), Some("winter-dark"));
    }

    #[test]
    fn test_apply_view_without_building_layer() {
        let mut renderer = RecordingRenderer::default();
        let mut loader = RecordingLoader::default();
        apply_view(&mut renderer, &mut loader, &MapViewConfig::flat_2d()).unwrap();
        assert!(renderer.layout.is_empty());
    }

    #[test]
    fn test_loader_failure_is_reported() {
        let mut renderer = RecordingRenderer::default();
        let result = apply_view(&mut renderer, &mut FailingLoader, &MapViewConfig::city_3d());
        assert!(matches!(result, Err(OverlayError::Render(RenderError::Backend(_)))));
    }

    #[test]
    fn test_invalid_view_rejected() {
        let mut renderer = RecordingRenderer::default();
        let mut loader = RecordingLoader::default();
        for config in [
            MapViewConfig::flat_2d().with_pitch(90.0),
            MapViewConfig::flat_2d().with_zoom(-1.0),
            MapViewConfig::flat_2d().with_center(Coordinate::new(0.0, 95.0)),
        ] {
            assert!(matches!(
                apply_view(&mut renderer, &mut loader, &config),
                Err(OverlayError::InvalidInput(_))
            ));
        }
    }
}
