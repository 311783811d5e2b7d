//! Competitor read endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::DatasetQuery;
use crate::{db, ApiResult, AppState};

/// One competitor as served to the dashboard
#[derive(Debug, Serialize)]
pub struct CompetitorResponse {
    pub id: String,
    pub name: String,
    pub mention_count: i64,
    pub avg_sentiment: f64,
    pub praise_themes: Vec<String>,
    pub complaint_themes: Vec<String>,
}

/// GET /api/competitors response
#[derive(Debug, Serialize)]
pub struct CompetitorListResponse {
    pub competitors: Vec<CompetitorResponse>,
}

/// GET /api/competitors?dataset_id=...
///
/// Competitors ordered by mention count (descending), theme JSON decoded
/// to arrays.
pub async fn list_competitors(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> ApiResult<Json<CompetitorListResponse>> {
    let dataset_id = query.require()?;

    let competitors = db::analysis::fetch_competitors(&state.db, &dataset_id)
        .await?
        .into_iter()
        .map(|c| CompetitorResponse {
            id: c.guid,
            name: c.name,
            mention_count: c.mention_count,
            avg_sentiment: c.avg_sentiment,
            praise_themes: c.praise_themes,
            complaint_themes: c.complaint_themes,
        })
        .collect();

    Ok(Json(CompetitorListResponse { competitors }))
}

/// Build competitor routes
pub fn competitor_routes() -> Router<AppState> {
    Router::new().route("/api/competitors", get(list_competitors))
}
