//! Analysis trigger and status endpoints

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::DatasetQuery;
use crate::engine::{run_full_pipeline, GeminiClient, GeminiError};
use crate::{db, ApiError, ApiResult, AppState};
use rvi_common::db::models::dataset_status;

/// POST /api/analyze request
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub dataset_id: Option<String>,
}

/// POST /api/analyze response
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub insight_count: i64,
    pub competitor_count: i64,
    pub action_item_count: i64,
}

/// GET /api/analyze response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub error: Option<String>,
}

/// POST /api/analyze
///
/// Runs the full pipeline for a dataset and blocks until it finishes.
/// A second trigger while the dataset is `analyzing` is a 409; the status
/// field is the only gate.
pub async fn trigger_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let dataset_id = request
        .dataset_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing dataset_id.".to_string()))?;

    let dataset = db::datasets::get(&state.db, &dataset_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dataset not found.".to_string()))?;

    if dataset.status == dataset_status::ANALYZING {
        return Err(ApiError::Conflict(
            "Analysis is already in progress.".to_string(),
        ));
    }

    // Key validation happens before the dataset is touched; a missing key
    // must not leave the dataset in an error state.
    let client = GeminiClient::new(&state.gemini).map_err(|err| match err {
        GeminiError::MissingApiKey => ApiError::BadRequest(err.to_string()),
        other => ApiError::Internal(other.to_string()),
    })?;

    info!(dataset = %dataset_id, "Analysis requested");

    let summary = run_full_pipeline(&state.db, &client, &dataset_id)
        .await
        .map_err(|err| {
            if err.is_rate_limit() {
                ApiError::RateLimited(err.to_string())
            } else {
                ApiError::Internal(err.to_string())
            }
        })?;

    Ok(Json(AnalyzeResponse {
        status: "complete".to_string(),
        insight_count: summary.insight_count,
        competitor_count: summary.competitor_count,
        action_item_count: summary.action_item_count,
    }))
}

/// GET /api/analyze?dataset_id=...
///
/// Poll the dataset's analysis status. The stored error message (if any)
/// rides along for display.
pub async fn analysis_status(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let dataset_id = query.require()?;

    let dataset = db::datasets::get(&state.db, &dataset_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dataset not found.".to_string()))?;

    Ok(Json(StatusResponse {
        status: dataset.status,
        error: dataset.error_msg,
    }))
}

/// Build analyze routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze", post(trigger_analysis).get(analysis_status))
}
