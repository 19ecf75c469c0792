use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::directions::{DirectionsClient, DirectionsError, DirectionsOptions};
use crate::settings::Settings;
use crate::trip::{region_data, LngLat, MapData, TripConfig};

/// Statistics of one ETL run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EtlStats {
    pub regions: usize,
    pub markers: usize,
    pub routes: usize,
    pub failed_routes: usize,
}

/// Anything that can turn waypoints into a route polyline.
#[allow(async_fn_in_trait)]
pub trait RouteSource {
    async fn route(&self, waypoints: &[LngLat]) -> Result<Vec<LngLat>, DirectionsError>;
}

impl RouteSource for DirectionsClient {
    async fn route(&self, waypoints: &[LngLat]) -> Result<Vec<LngLat>, DirectionsError> {
        DirectionsClient::route(self, waypoints).await
    }
}

/// Builds the map data for a trip, one directions request per region in order.
///
/// A failed route leaves that region without coordinates; the run continues.
pub async fn build_map_data<R: RouteSource>(config: &TripConfig, routes: &R) -> (MapData, EtlStats) {
    let mut stats = EtlStats::default();
    let mut regions = Vec::with_capacity(config.regions.len());

    for region in &config.regions {
        info!("🗺️  Generating marker and route layers for {}...", region.name);
        let mut data = region_data(region);
        stats.regions += 1;
        stats.markers += region.markers.len();

        let waypoints: Vec<LngLat> = region.markers.iter().map(|m| m.coordinates).collect();
        match routes.route(&waypoints).await {
            Ok(coordinates) => {
                info!("   ✅ {}: route with {} points", region.name, coordinates.len());
                data.coordinates = Some(coordinates);
                stats.routes += 1;
            }
            Err(DirectionsError::TooFewWaypoints(n)) => {
                info!("   ℹ️  {}: {} waypoint(s), no route", region.name, n);
            }
            Err(e) => {
                warn!("   ❌ Error getting directions for {}: {}", region.name, e);
                stats.failed_routes += 1;
            }
        }

        regions.push(data);
    }

    let map_data = MapData {
        generated_at: None,
        center: config.center,
        current_location: config.current_location,
        regions,
    };
    (map_data, stats)
}

/// Reads the trip config, builds map data and writes it to `output`.
pub async fn run(settings: &Settings, config_path: &Path, output: &Path) -> Result<EtlStats> {
    let start_time = std::time::Instant::now();
    let config = TripConfig::load(config_path)?;
    info!(
        "📂 Loaded {} region(s) from {}",
        config.regions.len(),
        config_path.display()
    );

    let access_token = settings
        .mapbox_token()
        .context("No Mapbox access token: set MAPBOX_TOKEN or mapbox_token in the settings file")?;

    let client = DirectionsClient::new(DirectionsOptions {
        endpoint: settings.directions_endpoint.clone(),
        profile: settings.routing_profile.clone(),
        access_token,
        sample_rate: settings.route_sample_rate,
    })?;

    let (mut map_data, stats) = build_map_data(&config, &client).await;
    map_data.generated_at = Some(chrono::Utc::now());
    map_data.save(output)?;

    info!("\n📊 ETL summary:");
    info!("   🌏 Regions: {}", stats.regions);
    info!("   📍 Markers: {}", stats.markers);
    info!("   🛣️  Routes: {} ({} failed)", stats.routes, stats.failed_routes);
    info!("   ⏱️  Time: {:.2} s", start_time.elapsed().as_secs_f64());
    info!("🎉 Map data written to {}", output.display());

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns the waypoints as the route, or fails for regions starting at longitude 0.
    struct StraightLines {
        calls: Mutex<usize>,
    }

    impl RouteSource for StraightLines {
        async fn route(&self, waypoints: &[LngLat]) -> Result<Vec<LngLat>, DirectionsError> {
            *self.calls.lock().unwrap() += 1;
            if waypoints.len() < 2 {
                return Err(DirectionsError::TooFewWaypoints(waypoints.len()));
            }
            if waypoints[0][0] == 0.0 {
                return Err(DirectionsError::NoRoute);
            }
            Ok(waypoints.to_vec())
        }
    }

    const TRIP: &str = r#"{
        "current_location": [98.3013584, 7.8311951],
        "regions": [
            { "name": "South", "markers": [
                { "name": "Phuket", "coordinates": [98.386793, 7.888931] },
                { "name": "Krabi", "coordinates": [98.9063, 8.0863] }
            ] },
            { "name": "Nowhere", "markers": [
                { "name": "Null Island", "coordinates": [0.0, 0.0] },
                { "name": "Also null", "coordinates": [0.0, 1.0] }
            ] },
            { "name": "Solo", "markers": [
                { "name": "Bangkok", "coordinates": [100.4935089, 13.7524938] }
            ] }
        ]
    }"#;

    #[tokio::test]
    async fn test_build_map_data_keeps_going_after_failures() {
        let config = TripConfig::from_json(TRIP).unwrap();
        let routes = StraightLines { calls: Mutex::new(0) };
        let (data, stats) = build_map_data(&config, &routes).await;

        assert_eq!(*routes.calls.lock().unwrap(), 3);
        assert_eq!(
            stats,
            EtlStats { regions: 3, markers: 5, routes: 1, failed_routes: 1 }
        );
        assert_eq!(data.current_location, Some([98.3013584, 7.8311951]));
        assert_eq!(data.regions.len(), 3);
        assert_eq!(data.regions[0].coordinates.as_ref().map(Vec::len), Some(2));
        assert!(data.regions[1].coordinates.is_none());
        assert!(data.regions[2].coordinates.is_none());
        assert!(data.regions[2].bounds.is_some());
    }

    #[tokio::test]
    async fn test_run_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("trip_config.json");
        std::fs::write(&config_path, TRIP).unwrap();

        let settings = Settings {
            mapbox_token: None,
            ..Settings::default()
        };
        if std::env::var("MAPBOX_TOKEN").is_ok() {
            return;
        }
        let result = run(&settings, &config_path, &dir.path().join("out.json")).await;
        assert!(result.is_err());
    }
}
