use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::utils;

pub const CONFIG_FILE_NAME: &str = "travelmap.ini";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub port: u16,
    pub trip_config: PathBuf,
    pub map_data: PathBuf,
    pub media_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub public_dir: PathBuf,
    pub mapbox_token: Option<String>,
    pub routing_profile: String,
    pub directions_endpoint: String,
    pub route_sample_rate: usize,
    pub image_max_width: u32,
    pub jpeg_quality: i32,
    pub region_zoom_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            trip_config: PathBuf::from(DEFAULT_TRIP_CONFIG),
            map_data: PathBuf::from(DEFAULT_MAP_DATA),
            media_dir: PathBuf::from(DEFAULT_MEDIA_DIR),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            mapbox_token: None,
            routing_profile: DEFAULT_ROUTING_PROFILE.to_string(),
            directions_endpoint: DIRECTIONS_ENDPOINT.to_string(),
            route_sample_rate: DEFAULT_ROUTE_SAMPLE_RATE,
            image_max_width: IMAGE_MAX_WIDTH,
            jpeg_quality: JPEG_QUALITY,
            region_zoom_threshold: REGION_ZOOM_THRESHOLD,
        }
    }
}

fn parse_into<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, target: &mut T) {
    if let Some(value) = map.get(key) {
        match value.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!("Ignoring invalid value for {}: {}", key, value),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Reads `key = value` lines; `#` starts a comment. Missing keys keep their defaults.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        if !config_path.exists() {
            return Ok(settings);
        }

        let file = File::open(config_path).context("Failed to open config file")?;
        let reader = BufReader::new(file);
        let mut config_map = HashMap::new();

        for line in reader.lines() {
            let line = line.context("Failed to read line from config")?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(
                    key.trim().to_string(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
        }

        parse_into(&config_map, "port", &mut settings.port);
        parse_into(&config_map, "trip_config", &mut settings.trip_config);
        parse_into(&config_map, "map_data", &mut settings.map_data);
        parse_into(&config_map, "media_dir", &mut settings.media_dir);
        parse_into(&config_map, "assets_dir", &mut settings.assets_dir);
        parse_into(&config_map, "public_dir", &mut settings.public_dir);
        parse_into(&config_map, "routing_profile", &mut settings.routing_profile);
        parse_into(&config_map, "directions_endpoint", &mut settings.directions_endpoint);
        parse_into(&config_map, "route_sample_rate", &mut settings.route_sample_rate);
        parse_into(&config_map, "image_max_width", &mut settings.image_max_width);
        parse_into(&config_map, "jpeg_quality", &mut settings.jpeg_quality);
        parse_into(&config_map, "region_zoom_threshold", &mut settings.region_zoom_threshold);

        if let Some(token) = config_map.get("mapbox_token") {
            if !token.is_empty() {
                settings.mapbox_token = Some(token.clone());
            }
        }

        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            utils::ensure_directory_exists(parent).context("Creating config directory")?;
        }

        let mut content = String::new();
        content.push_str("# TravelMap Configuration File\n");
        content.push_str(&format!("port = {}\n", self.port));
        content.push_str(&format!("trip_config = \"{}\"\n", self.trip_config.display()));
        content.push_str(&format!("map_data = \"{}\"\n", self.map_data.display()));
        content.push_str(&format!("media_dir = \"{}\"\n", self.media_dir.display()));
        content.push_str(&format!("assets_dir = \"{}\"\n", self.assets_dir.display()));
        content.push_str(&format!("public_dir = \"{}\"\n", self.public_dir.display()));
        if let Some(ref token) = self.mapbox_token {
            content.push_str(&format!("mapbox_token = \"{}\"\n", token));
        }
        content.push_str(&format!("routing_profile = {}\n", self.routing_profile));
        content.push_str(&format!("directions_endpoint = {}\n", self.directions_endpoint));
        content.push_str(&format!("route_sample_rate = {}\n", self.route_sample_rate));
        content.push_str(&format!("image_max_width = {}\n", self.image_max_width));
        content.push_str(&format!("jpeg_quality = {}\n", self.jpeg_quality));
        content.push_str(&format!("region_zoom_threshold = {}\n", self.region_zoom_threshold));

        std::fs::write(config_path, content).context("Failed to write to config file")?;
        Ok(())
    }

    /// `MAPBOX_TOKEN` in the environment wins over the settings file.
    pub fn mapbox_token(&self) -> Option<String> {
        std::env::var("MAPBOX_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.mapbox_token.clone())
    }

    /// A `travelmap.ini` in the working directory takes precedence over the app data one.
    pub fn config_path() -> PathBuf {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            local
        } else {
            utils::get_config_path()
        }
    }
}
