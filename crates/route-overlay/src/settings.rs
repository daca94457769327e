use clap::Parser;
use route_overlay_lib::{Coordinate, MatchTolerance, MatcherConfig};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Route Overlay - Extract the traveled part of a GeoJSON route network between two points
pub struct Settings {
    /// GeoJSON FeatureCollection of LineStrings describing the route network
    #[clap(short, long, value_name = "FILE")]
    pub network: PathBuf,

    /// Start of the trip as LON,LAT
    #[clap(short, long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    pub start: Coordinate,

    /// End of the trip as LON,LAT
    #[clap(short, long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    pub end: Coordinate,

    /// Use a fixed matching tolerance in kilometers instead of the trip distance
    #[clap(long, value_name = "KM")]
    pub fixed_tolerance_km: Option<f64>,

    /// Minimum number of features before the network is scanned in parallel
    #[clap(long, default_value = "4096")]
    pub parallel_min_features: usize,

    /// Write the matched FeatureCollection to this file instead of stdout
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[clap(long, default_value = "false")]
    pub pretty: bool,
}

impl Settings {
    /// Matcher configuration selected by the arguments
    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            tolerance: match self.fixed_tolerance_km {
                Some(km) => MatchTolerance::Fixed { km },
                None => MatchTolerance::TripDistance,
            },
            parallel_min_features: self.parallel_min_features,
        }
    }
}

/// Parse `LON,LAT` into a validated coordinate
fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (lon, lat) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LON,LAT, got {value:?}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude {lon:?}: {e}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude {lat:?}: {e}"))?;
    Coordinate::try_new(lon, lat).map_err(|e| e.to_string())
}
