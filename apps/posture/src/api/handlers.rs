//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        AssessRequest, AssessResponse, ClassifyRequest, ClassifyResponse, HealthResponse,
        InsightsRequest, InsightsResponse, WeightsResponse,
    },
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use posture_core::{Insights, RowFilter};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// WEIGHTS HANDLER
// =============================================================================

/// Effective risk-weight table.
pub async fn weights_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.assessor.pipeline().engine();
    (StatusCode::OK, Json(WeightsResponse::from(engine)))
}

// =============================================================================
// ASSESS HANDLER
// =============================================================================

/// Annotate a table.
pub async fn assess_handler(
    State(state): State<AppState>,
    Json(request): Json<AssessRequest>,
) -> impl IntoResponse {
    let filter = RowFilter::new(request.framework.as_deref(), request.domain.as_deref());

    match state
        .assessor
        .assess(&request.rows, &filter, request.generative)
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(AssessResponse::success(rows))),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(AssessResponse::error(format!("Assessment failed: {}", e))),
        ),
    }
}

// =============================================================================
// INSIGHTS HANDLER
// =============================================================================

/// Aggregate insights over a table.
///
/// The aggregates cover every row; `framework` and `domain` only narrow the
/// reported selection.
pub async fn insights_handler(
    State(state): State<AppState>,
    Json(request): Json<InsightsRequest>,
) -> impl IntoResponse {
    let filter = RowFilter::new(request.framework.as_deref(), request.domain.as_deref());

    match state
        .assessor
        .assess(&request.rows, &RowFilter::default(), false)
        .await
    {
        Ok(rows) => {
            let insights = Insights::with_selection(&rows, &filter, request.limits());
            (StatusCode::OK, Json(InsightsResponse::success(insights)))
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(InsightsResponse::error(format!("Insights failed: {}", e))),
        ),
    }
}

// =============================================================================
// CLASSIFY HANDLER
// =============================================================================

/// Annotate a single row.
pub async fn classify_handler(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> impl IntoResponse {
    match state
        .assessor
        .classify(&request.record, request.generative)
        .await
    {
        Ok(row) => (StatusCode::OK, Json(ClassifyResponse::success(row))),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ClassifyResponse::error(format!("Classification failed: {}", e))),
        ),
    }
}
