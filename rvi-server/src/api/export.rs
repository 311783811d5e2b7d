//! Report export endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::report::{csv_report, pdf_report};
use crate::{db, ApiError, ApiResult, AppState};

/// POST /api/export request
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub dataset_id: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "pdf".to_string()
}

/// POST /api/export
///
/// Returns the dataset's analysis as downloadable bytes: a flat CSV
/// report or the battlecard PDF.
pub async fn export_dataset(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<Response> {
    let dataset_id = request
        .dataset_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing dataset_id.".to_string()))?;

    let dataset = db::datasets::get(&state.db, &dataset_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dataset not found.".to_string()))?;

    let insights = db::analysis::fetch_insights(&state.db, &dataset_id).await?;
    let competitors = db::analysis::fetch_competitors(&state.db, &dataset_id).await?;
    let action_items = db::analysis::fetch_action_items(&state.db, &dataset_id).await?;

    info!(
        dataset = %dataset_id,
        format = %request.format,
        "Export requested"
    );

    match request.format.as_str() {
        "csv" => {
            let bytes = csv_report::render(&insights, &competitors, &action_items)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"reviewintel-export.csv\"",
                    ),
                ],
                bytes,
            )
                .into_response())
        }
        "pdf" => {
            let bytes = pdf_report::render(&insights, &competitors, &action_items, &dataset.name)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "application/pdf"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"reviewintel-battlecard.pdf\"",
                    ),
                ],
                bytes,
            )
                .into_response())
        }
        other => Err(ApiError::BadRequest(format!(
            "Invalid format: {other}. Must be one of: pdf, csv"
        ))),
    }
}

/// Build export routes
pub fn export_routes() -> Router<AppState> {
    Router::new().route("/api/export", post(export_dataset))
}
