use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::state::AppState;
use crate::popup::render_popup_html;
use crate::trip::{Bounds, MapData};
use crate::viewport::{placement, ContentSize, Placement, Viewport};

fn read_map_data(state: &AppState) -> Result<std::sync::RwLockReadGuard<'_, MapData>, StatusCode> {
    state.map_data.read().map_err(|_| {
        error!("Map data lock poisoned");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Map data plus the client-side settings that go with it.
#[derive(Debug, Serialize)]
pub struct MapResponse {
    #[serde(flatten)]
    pub data: MapData,
    /// Zoom level below which the client dismisses marker popups.
    pub region_zoom_threshold: f64,
}

pub async fn get_map_data(State(state): State<AppState>) -> Result<Json<MapResponse>, StatusCode> {
    let data = read_map_data(&state)?;
    Ok(Json(MapResponse {
        data: data.clone(),
        region_zoom_threshold: state.settings.region_zoom_threshold,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub regions: usize,
}

/// Re-reads the map data file written by the ETL step
pub async fn reload_map_data(State(state): State<AppState>) -> Result<Json<ReloadResponse>, StatusCode> {
    let path = state.settings.map_data.clone();
    let fresh = tokio::task::spawn_blocking(move || MapData::load(&path))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map_err(|e| {
            error!("Failed to reload map data: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let regions = fresh.regions.len();
    let mut data = state.map_data.write().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    *data = fresh;
    info!("🔄 Reloaded map data: {} regions", regions);

    Ok(Json(ReloadResponse { regions }))
}

pub async fn get_region_bounds(
    State(state): State<AppState>,
    AxumPath(region): AxumPath<String>,
) -> Result<Json<Bounds>, StatusCode> {
    let data = read_map_data(&state)?;
    data.region(&region)
        .and_then(|r| r.bounds)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Popup subtree for one marker. Markers without media get 204: they never open a carousel.
pub async fn get_popup(
    State(state): State<AppState>,
    AxumPath((region, marker)): AxumPath<(String, usize)>,
) -> Result<Response, StatusCode> {
    let content = {
        let data = read_map_data(&state)?;
        data.region(&region)
            .and_then(|r| r.popup_content(marker))
            .ok_or(StatusCode::NOT_FOUND)?
    };

    if !content.has_carousel() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok((
        [(header::CACHE_CONTROL, "no-cache")],
        Html(render_popup_html(&content)),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct PlacementQuery {
    pub width: u32,
    pub height: u32,
    pub content_width: Option<f64>,
    pub content_height: Option<f64>,
}

pub async fn get_placement(Query(query): Query<PlacementQuery>) -> Json<Placement> {
    let viewport = Viewport::new(query.width, query.height);
    let content = ContentSize {
        width: query.content_width.unwrap_or(0.0),
        height: query.content_height.unwrap_or(0.0),
    };
    Json(placement(viewport, content))
}
