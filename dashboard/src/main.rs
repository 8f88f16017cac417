// ==============================================================================
// main.rs - Cell Population Dashboard Entry Point
// ==============================================================================
// Description: Axum web server serving filtered cell population dashboards
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

mod handlers;
mod models;
mod state;

use state::AppState;

const DEFAULT_PORT: u16 = 8050;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    info!("Starting Cell Population Dashboard v1.0.0");

    // Load environment variables
    dotenvy::dotenv().ok();

    let server_port = match std::env::var("DASHBOARD_PORT") {
        Ok(port) => port
            .parse::<u16>()
            .with_context(|| format!("Invalid DASHBOARD_PORT: {}", port))?,
        Err(_) => DEFAULT_PORT,
    };

    let state = AppState::from_env()
        .await
        .context("Failed to initialize application state")?;

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    info!("Dashboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/filters", get(handlers::get_filters))
        .route("/view", post(handlers::compute_view))
        .route("/boxplots.svg", post(handlers::boxplots_svg));

    // Origins are configured via CORS_ALLOWED_ORIGINS env var (comma-separated)
    let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    let allowed_origins: Vec<_> = cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_credentials(false)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .nest("/api/dashboard", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                // Filter selections are small JSON documents
                .layer(DefaultBodyLimit::max(64 * 1024)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cell_populations::ingest::ingest_csv;
    use cell_populations::Snapshot;
    use std::io::Write;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const CSV: &str = "\
project,subject,condition,age,sex,treatment,response,sample,sample_type,time_from_treatment_start,b_cell,cd8_t_cell,cd4_t_cell,nk_cell,monocyte
prj1,sbj1,melanoma,57,F,tr1,yes,s1,PBMC,0,500,125,125,125,125
prj1,sbj2,melanoma,61,M,tr1,yes,s2,PBMC,0,600,100,100,100,100
prj1,sbj3,melanoma,45,F,tr1,no,s3,PBMC,0,100,225,225,225,225
prj2,sbj4,melanoma,50,F,tr1,no,s4,PBMC,0,200,200,200,200,200
prj3,sbj5,healthy,38,M,none,,s5,PBMC,,300,175,175,175,175
";

    /// State backed by a freshly ingested temporary database
    fn test_state() -> (TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("cell-count.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let db_path = dir.path().join("cells.db");
        ingest_csv(&csv_path, &db_path).unwrap();
        let snapshot = Snapshot::load(&db_path).unwrap();

        (dir, AppState::from_snapshot(snapshot, db_path))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["samples"], 5);
    }

    #[tokio::test]
    async fn test_filter_options() {
        let (_dir, state) = test_state();
        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/dashboard/filters")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["conditions"], serde_json::json!(["melanoma", "healthy"]));
        assert_eq!(json["times"], serde_json::json!([0, null]));
    }

    #[tokio::test]
    async fn test_view_for_selection() {
        let (_dir, state) = test_state();
        let selection = serde_json::json!({
            "conditions": ["melanoma"],
            "treatments": ["tr1"],
            "sampleTypes": ["PBMC"],
            "selectedTimes": [0]
        });

        let response = build_router(state)
            .oneshot(post_json("/api/dashboard/view", selection))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sample_count"], 4);
        assert_eq!(json["summary"].as_array().unwrap().len(), 20);
        assert_eq!(json["statistics"]["b_cell"]["outcome"]["status"], "tested");
        assert_eq!(json["project_chart"]["title"], "Samples Per Project");
    }

    #[tokio::test]
    async fn test_empty_selection_is_not_an_error() {
        let (_dir, state) = test_state();
        let selection = serde_json::json!({
            "conditions": [],
            "treatments": ["tr1"],
            "sampleTypes": ["PBMC"],
            "selectedTimes": [0]
        });

        let response = build_router(state)
            .oneshot(post_json("/api/dashboard/view", selection))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sample_count"], 0);
        assert_eq!(json["summary"], serde_json::json!([]));
        assert_eq!(
            json["statistics"]["b_cell"]["outcome"]["status"],
            "insufficient_data"
        );
    }

    #[tokio::test]
    async fn test_missing_dimension_is_bad_request() {
        let (_dir, state) = test_state();
        let selection = serde_json::json!({
            "conditions": ["melanoma"],
            "treatments": ["tr1"],
            "sampleTypes": ["PBMC"]
        });

        let response = build_router(state)
            .oneshot(post_json("/api/dashboard/view", selection))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid filter selection");
    }
}
