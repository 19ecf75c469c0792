use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer,
};
use tracing::info;

pub mod handlers;
pub mod state;

pub use self::state::AppState;
use crate::constants::ASSET_CACHE_CONTROL;
use handlers::{get_map_data, get_placement, get_popup, get_region_bounds, reload_map_data};

// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let assets = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(ASSET_CACHE_CONTROL),
        ))
        .service(ServeDir::new(&state.settings.assets_dir));
    let public_dir = state.settings.public_dir.clone();

    Router::new()
        .route("/api/map", get(get_map_data))
        .route("/api/reload", post(reload_map_data))
        .route("/api/regions/:region/bounds", get(get_region_bounds))
        .route("/api/popup/:region/:marker", get(get_popup))
        .route("/api/placement", get(get_placement))
        .with_state(state)
        .nest_service("/assets", assets)
        .fallback_service(ServeDir::new(public_dir))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new()),
        )
}

pub async fn start_server(state: AppState) -> Result<()> {
    let port = state.settings.port;
    let app = create_app(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;

    info!("🌐 Server running at http://127.0.0.1:{}", port);
    info!("   🗺️  API endpoints:");
    info!("      - GET  /api/map - Regions, markers, routes, bounds and zoom threshold");
    info!("      - POST /api/reload - Re-read the map data file");
    info!("      - GET  /api/regions/<region>/bounds - Bounding box for fit-to-region");
    info!("      - GET  /api/popup/<region>/<marker> - Popup carousel HTML");
    info!("      - GET  /api/placement?width=&height= - Popup placement for a viewport");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("👋 Shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::trip::{region_data, MapData, TripConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const TRIP: &str = r#"[
        { "name": "Thailand", "markers": [
            { "name": "Phuket", "coordinates": [98.386793, 7.888931],
              "images": ["/assets/a.jpg", "/assets/b.mp4", "/assets/c.jpg"] },
            { "name": "Krabi", "coordinates": [98.9063, 8.0863] }
        ] }
    ]"#;

    fn test_state(dir: &std::path::Path) -> AppState {
        let config = TripConfig::from_json(TRIP).unwrap();
        let map_data = MapData {
            generated_at: None,
            center: Some([98.33937, 7.964535]),
            current_location: None,
            regions: config.regions.iter().map(region_data).collect(),
        };

        let assets_dir = dir.join("assets");
        let public_dir = dir.join("public");
        std::fs::create_dir_all(&assets_dir).unwrap();
        std::fs::create_dir_all(&public_dir).unwrap();
        std::fs::write(assets_dir.join("a.jpg"), "jpeg bytes").unwrap();
        std::fs::write(public_dir.join("index.html"), "<html></html>").unwrap();

        let settings = Settings {
            assets_dir,
            public_dir,
            map_data: dir.join("mapbox_data.json"),
            region_zoom_threshold: 7.5,
            ..Settings::default()
        };
        AppState::new(settings, map_data)
    }

    async fn get_request(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_map_data_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(test_state(dir.path()));
        let resp = get_request(app, "/api/map").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(value["regions"][0]["name"], "Thailand");
        assert_eq!(value["regions"][0]["markers"]["type"], "FeatureCollection");
        assert_eq!(value["region_zoom_threshold"], 7.5);
    }

    #[tokio::test]
    async fn test_popup_endpoint_renders_carousel() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(test_state(dir.path()));
        let resp = get_request(app, "/api/popup/thailand/0").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let html = body_string(resp).await;
        assert_eq!(html.matches("carousel-img ").count(), 3);
        assert!(html.contains(r#"<span class="dot active"></span>"#));
    }

    #[tokio::test]
    async fn test_popup_without_images_has_no_content() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = get_request(create_app(state.clone()), "/api/popup/Thailand/1").await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = get_request(create_app(state), "/api/popup/Thailand/7").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_region_bounds_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = get_request(create_app(state.clone()), "/api/regions/Thailand/bounds").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        let southwest_lng = value["southwest"][0].as_f64().unwrap();
        let northeast_lat = value["northeast"][1].as_f64().unwrap();
        assert!((southwest_lng - 98.386793).abs() < 1e-9);
        assert!((northeast_lat - 8.0863).abs() < 1e-9);

        let resp = get_request(create_app(state), "/api/regions/Laos/bounds").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_placement_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(test_state(dir.path()));
        let resp = get_request(
            app,
            "/api/placement?width=500&height=900&content_width=300&content_height=200",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(value["layout"], "mobile-portrait");
        assert_eq!(value["offset"]["dx"], -150.0);
        assert_eq!(value["offset"]["dy"], -250.0);
        assert_eq!(value["style"]["class_name"], "popup-content-mobile");
    }

    #[tokio::test]
    async fn test_assets_are_served_with_cache_header() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let resp = get_request(create_app(state.clone()), "/assets/a.jpg").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("cache-control").unwrap(), ASSET_CACHE_CONTROL);

        let resp = get_request(create_app(state), "/index.html").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reload_reads_map_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        MapData::default().save(&state.settings.map_data).unwrap();

        let resp = create_app(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.map_data.read().unwrap().regions.is_empty());
    }
}
