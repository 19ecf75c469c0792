//! Route geometry from the Mapbox Directions API.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::trip::LngLat;

#[derive(Debug, Error)]
pub enum DirectionsError {
    #[error("a route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),
    #[error("directions request failed with HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("directions response contained no route")]
    NoRoute,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
pub struct Route {
    pub geometry: RouteGeometry,
}

#[derive(Debug, Deserialize)]
pub struct RouteGeometry {
    pub coordinates: Vec<LngLat>,
}

/// Keeps every `rate`-th point, starting with the first. A rate of 0 or 1 keeps everything.
pub fn sample_coordinates(coordinates: Vec<LngLat>, rate: usize) -> Vec<LngLat> {
    if rate <= 1 {
        return coordinates;
    }
    coordinates
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % rate == 0)
        .map(|(_, c)| c)
        .collect()
}

/// Takes the first route's geometry and samples it.
pub fn route_coordinates(
    response: DirectionsResponse,
    sample_rate: usize,
) -> Result<Vec<LngLat>, DirectionsError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(DirectionsError::NoRoute)?;
    Ok(sample_coordinates(route.geometry.coordinates, sample_rate))
}

#[derive(Debug, Clone)]
pub struct DirectionsOptions {
    pub endpoint: String,
    pub profile: String,
    pub access_token: String,
    pub sample_rate: usize,
}

pub struct DirectionsClient {
    client: reqwest::Client,
    options: DirectionsOptions,
}

impl DirectionsClient {
    pub fn new(options: DirectionsOptions) -> Result<Self, DirectionsError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, options })
    }

    fn waypoints_path(waypoints: &[LngLat]) -> String {
        waypoints
            .iter()
            .map(|[lng, lat]| format!("{},{}", lng, lat))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Request URL without the access token, safe to log.
    pub fn route_url(&self, waypoints: &[LngLat]) -> String {
        let mut endpoint = self.options.endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        format!(
            "{}{}/{}?alternatives=true&steps=true&geometries=geojson&overview=full",
            endpoint,
            self.options.profile,
            Self::waypoints_path(waypoints)
        )
    }

    pub async fn route(&self, waypoints: &[LngLat]) -> Result<Vec<LngLat>, DirectionsError> {
        if waypoints.len() < 2 {
            return Err(DirectionsError::TooFewWaypoints(waypoints.len()));
        }

        let url = self.route_url(waypoints);
        debug!("Requesting directions: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", self.options.access_token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectionsError::Status(status));
        }

        let body: DirectionsResponse = response.json().await?;
        route_coordinates(body, self.options.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> DirectionsOptions {
        DirectionsOptions {
            endpoint: "https://api.mapbox.com/directions/v5/mapbox".to_string(),
            profile: "driving".to_string(),
            access_token: "secret".to_string(),
            sample_rate: 2,
        }
    }

    #[test]
    fn test_route_url() {
        let client = DirectionsClient::new(options()).unwrap();
        let url = client.route_url(&[[98.386793, 7.888931], [98.9858802, 18.7882778]]);
        assert_eq!(
            url,
            "https://api.mapbox.com/directions/v5/mapbox/driving/98.386793,7.888931;98.9858802,18.7882778\
             ?alternatives=true&steps=true&geometries=geojson&overview=full"
        );
        assert!(!url.contains("secret"));
    }

    #[test]
    fn test_sampling_keeps_every_nth_point() {
        let coords: Vec<LngLat> = (0..7).map(|i| [i as f64, 0.0]).collect();
        let sampled = sample_coordinates(coords.clone(), 3);
        assert_eq!(sampled, vec![[0.0, 0.0], [3.0, 0.0], [6.0, 0.0]]);
        assert_eq!(sample_coordinates(coords.clone(), 1), coords);
        assert_eq!(sample_coordinates(coords.clone(), 0), coords);
    }

    #[test]
    fn test_first_route_is_used() {
        let json = r#"{
            "code": "Ok",
            "routes": [
                { "geometry": { "type": "LineString", "coordinates": [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]] }, "distance": 10.0 },
                { "geometry": { "type": "LineString", "coordinates": [[9.0, 9.0]] } }
            ],
            "waypoints": []
        }"#;
        let response: DirectionsResponse = serde_json::from_str(json).unwrap();
        let coords = route_coordinates(response, 2).unwrap();
        assert_eq!(coords, vec![[1.0, 2.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_missing_route_is_an_error() {
        let response: DirectionsResponse = serde_json::from_str(r#"{"code": "NoRoute"}"#).unwrap();
        assert!(matches!(route_coordinates(response, 1), Err(DirectionsError::NoRoute)));
    }

    #[tokio::test]
    async fn test_single_waypoint_skips_request() {
        let client = DirectionsClient::new(options()).unwrap();
        let result = client.route(&[[1.0, 2.0]]).await;
        assert!(matches!(result, Err(DirectionsError::TooFewWaypoints(1))));
    }
}
