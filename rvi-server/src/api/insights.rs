//! Insight read endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::DatasetQuery;
use crate::db::analysis::InsightWithQuotes;
use crate::{db, ApiResult, AppState};

/// GET /api/insights response
#[derive(Debug, Serialize)]
pub struct InsightListResponse {
    pub insights: Vec<InsightWithQuotes>,
}

/// GET /api/insights?dataset_id=...
///
/// Insights ordered by confidence (descending), each with its source
/// quotes embedded. An unknown dataset simply yields an empty list.
pub async fn list_insights(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> ApiResult<Json<InsightListResponse>> {
    let dataset_id = query.require()?;
    let insights = db::analysis::fetch_insights(&state.db, &dataset_id).await?;
    Ok(Json(InsightListResponse { insights }))
}

/// Build insight routes
pub fn insight_routes() -> Router<AppState> {
    Router::new().route("/api/insights", get(list_insights))
}
