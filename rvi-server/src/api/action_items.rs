//! Action item read and update endpoints

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::DatasetQuery;
use crate::db::analysis::ActionItemWithContext;
use crate::{db, ApiError, ApiResult, AppState};
use rvi_common::db::models::{ActionItem, ACTION_ITEM_STATUSES};

/// GET /api/action-items response
#[derive(Debug, Serialize)]
pub struct ActionItemListResponse {
    pub action_items: Vec<ActionItemWithContext>,
}

/// PATCH /api/action-items request
#[derive(Debug, Deserialize)]
pub struct UpdateActionItemRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

/// PATCH /api/action-items response
#[derive(Debug, Serialize)]
pub struct UpdateActionItemResponse {
    pub action_item: ActionItem,
}

/// GET /api/action-items?dataset_id=...
///
/// Action items with their related insight context and source quotes.
pub async fn list_action_items(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> ApiResult<Json<ActionItemListResponse>> {
    let dataset_id = query.require()?;
    let action_items = db::analysis::fetch_action_items(&state.db, &dataset_id).await?;
    Ok(Json(ActionItemListResponse { action_items }))
}

/// PATCH /api/action-items
///
/// Move an action item through its status lifecycle. The status value is
/// enum-constrained; anything else is a 400.
pub async fn update_action_item(
    State(state): State<AppState>,
    Json(request): Json<UpdateActionItemRequest>,
) -> ApiResult<Json<UpdateActionItemResponse>> {
    let id = request
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing id or status.".to_string()))?;
    let status = request
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing id or status.".to_string()))?;

    if !ACTION_ITEM_STATUSES.contains(&status.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Invalid status. Must be one of: {}",
            ACTION_ITEM_STATUSES.join(", ")
        )));
    }

    let action_item = db::analysis::update_action_item_status(&state.db, &id, &status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Action item not found.".to_string()))?;

    info!(action_item = %id, status = %status, "Action item status updated");

    Ok(Json(UpdateActionItemResponse { action_item }))
}

/// Build action item routes
pub fn action_item_routes() -> Router<AppState> {
    Router::new().route(
        "/api/action-items",
        get(list_action_items).patch(update_action_item),
    )
}
