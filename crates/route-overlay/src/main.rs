//! Route Overlay - command-line front-end
//!
//! Loads a route network, matches the traveled part between two points and writes it as a
//! GeoJSON FeatureCollection ready to be drawn as a line layer.

mod logging;
mod settings;

use anyhow::Context;
use clap::Parser;
use route_overlay_lib::{MatchedRoute, RouteNetwork, RouteSegmentMatcher};
use settings::Settings;
use std::io::Write;

fn main() -> anyhow::Result<()> {
    logging::setup_logging();
    let settings = Settings::parse();
    run(&settings)
}

fn run(settings: &Settings) -> anyhow::Result<()> {
    let network = RouteNetwork::load_from_file(&settings.network)
        .with_context(|| format!("Failed to load {}", settings.network.display()))?;
    if network.skipped_features() > 0 {
        tracing::warn!(
            "{} malformed features were skipped",
            network.skipped_features()
        );
    }

    let matcher = RouteSegmentMatcher::new(settings.matcher_config());
    let matched = matcher
        .match_route(&network, settings.start, settings.end)
        .context("Failed to match route")?;
    log_summary(&matched);

    let collection = matched.to_feature_collection();
    let json = if settings.pretty {
        serde_json::to_string_pretty(&collection)?
    } else {
        serde_json::to_string(&collection)?
    };

    match &settings.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

fn log_summary(matched: &MatchedRoute) {
    if matched.is_anchor_only() {
        tracing::info!(
            "No route segment within {:.3} km of {} or {}",
            matched.threshold_km(),
            matched.start(),
            matched.end()
        );
    } else {
        tracing::info!(
            "Matched {} route segments between {} and {} (threshold {:.3} km)",
            matched.matched_features().len(),
            matched.start(),
            matched.end(),
            matched.threshold_km()
        );
    }
}
