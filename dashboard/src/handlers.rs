// ==============================================================================
// handlers.rs - Dashboard API Request Handlers
// ==============================================================================
// Description: HTTP handlers for filter options, dashboard views and charts
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tracing::{debug, error};

use cell_populations::charts::render_boxplots_svg;
use cell_populations::snapshot::FilterOptions;
use cell_populations::{DashboardView, FilterSelection};

use crate::models::{ApiInfoResponse, ErrorResponse, HealthResponse, ReadinessResponse};
use crate::state::AppState;

/// Root endpoint - API information
pub async fn root() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "Cell Population Dashboard",
        version: "1.0.0",
        endpoints: vec![
            "/health - Health check",
            "/ready - Readiness check",
            "/api/dashboard/filters - Selectable filter values (GET)",
            "/api/dashboard/view - Dashboard view for a filter selection (POST)",
            "/api/dashboard/boxplots.svg - Responder boxplots as SVG (POST)",
        ],
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: "1.0.0",
        timestamp: Utc::now(),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db_path().exists();
    let samples = state.snapshot().len();
    let ready = database && samples > 0;

    let response = ReadinessResponse {
        ready,
        database,
        samples,
        loaded_at: state.loaded_at(),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Distinct condition, treatment, sample type and time values
pub async fn get_filters(State(state): State<AppState>) -> Json<FilterOptions> {
    Json(state.snapshot().filter_options())
}

/// Recompute the dashboard for a filter selection
pub async fn compute_view(
    State(state): State<AppState>,
    payload: Result<Json<FilterSelection>, JsonRejection>,
) -> Result<Json<DashboardView>, AppError> {
    let Json(selection) = payload?;
    debug!("Dashboard view requested: {:?}", selection);

    Ok(Json(DashboardView::compute(state.snapshot(), &selection)))
}

/// Boxplot figure for a filter selection, rendered as SVG
pub async fn boxplots_svg(
    State(state): State<AppState>,
    payload: Result<Json<FilterSelection>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(selection) = payload?;
    let view = DashboardView::compute(state.snapshot(), &selection);

    let svg = render_boxplots_svg(&view.boxplots).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

// ==============================================================================
// ERROR HANDLING
// ==============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details("Invalid filter selection", msg),
            ),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
