//! Trip configuration and the map data document generated from it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::popup::PopupContent;

/// `[longitude, latitude]`, GeoJSON order.
pub type LngLat = [f64; 2];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub name: String,
    pub coordinates: LngLat,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub captions: Vec<String>,
    #[serde(default)]
    pub ignore: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    #[serde(default)]
    pub markers: Vec<MarkerConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TripConfig {
    #[serde(default)]
    pub center: Option<LngLat>,
    #[serde(default)]
    pub current_location: Option<LngLat>,
    pub regions: Vec<RegionConfig>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TripConfigFile {
    Regions(Vec<RegionConfig>),
    Full(TripConfig),
}

impl TripConfig {
    /// Accepts either a bare array of regions or the full object form.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TripConfigFile =
            serde_json::from_str(json).context("Failed to parse trip config")?;
        Ok(match file {
            TripConfigFile::Regions(regions) => TripConfig {
                regions,
                ..Default::default()
            },
            TripConfigFile::Full(config) => config,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trip config {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerProperties {
    pub message: String,
    pub icon: Option<String>,
    pub images: Vec<String>,
    pub captions: Vec<String>,
    pub ignore: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: LngLat },
    LineString { coordinates: Vec<LngLat> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub properties: MarkerProperties,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

pub fn marker_feature_collection(markers: &[MarkerConfig]) -> FeatureCollection {
    let features = markers
        .iter()
        .map(|marker| Feature {
            properties: MarkerProperties {
                message: marker.name.clone(),
                icon: marker.icon.clone(),
                images: marker.images.clone(),
                captions: marker.captions.clone(),
                ignore: marker.ignore,
            },
            geometry: Geometry::Point {
                coordinates: marker.coordinates,
            },
        })
        .collect();
    FeatureCollection { features }
}

/// Southwest/northeast corners used for "fit to region".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub southwest: LngLat,
    pub northeast: LngLat,
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LngLat>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Bounds {
            southwest: first,
            northeast: first,
        };
        for [lng, lat] in iter {
            bounds.southwest[0] = bounds.southwest[0].min(*lng);
            bounds.southwest[1] = bounds.southwest[1].min(*lat);
            bounds.northeast[0] = bounds.northeast[0].max(*lng);
            bounds.northeast[1] = bounds.northeast[1].max(*lat);
        }
        Some(bounds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionData {
    pub name: String,
    pub markers: FeatureCollection,
    /// Route polyline; `None` when the directions lookup failed or was skipped.
    pub coordinates: Option<Vec<LngLat>>,
    pub bounds: Option<Bounds>,
}

impl RegionData {
    /// Popup content for a marker, or `None` for an unknown or ignored marker.
    pub fn popup_content(&self, marker: usize) -> Option<PopupContent> {
        let feature = self.markers.features.get(marker)?;
        if feature.properties.ignore {
            return None;
        }
        Some(PopupContent::new(
            feature.properties.message.clone(),
            &feature.properties.images,
            &feature.properties.captions,
        ))
    }
}

/// Everything the map client loads: regions with markers, routes and bounds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub center: Option<LngLat>,
    pub current_location: Option<LngLat>,
    pub regions: Vec<RegionData>,
}

impl MapData {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read map data {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse map data {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Creating map data directory")?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write map data {}", path.display()))
    }

    pub fn region(&self, name: &str) -> Option<&RegionData> {
        self.regions.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }
}

/// Region data without a route; bounds cover every marker that is shown on the map.
pub fn region_data(region: &RegionConfig) -> RegionData {
    let bounds = Bounds::from_points(
        region
            .markers
            .iter()
            .filter(|m| !m.ignore)
            .map(|m| &m.coordinates),
    );
    RegionData {
        name: region.name.clone(),
        markers: marker_feature_collection(&region.markers),
        coordinates: None,
        bounds,
    }
}
