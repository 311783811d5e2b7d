//! CSV upload endpoint

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::engine::columns;
use crate::{db, ApiError, ApiResult, AppState};

/// POST /api/upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub dataset_id: String,
    pub review_count: usize,
    pub status: String,
}

/// POST /api/upload
///
/// Accepts a multipart form with a `file` part holding the CSV. Parses the
/// reviews and stores the dataset in `parsing` status, ready for analysis.
pub async fn upload_dataset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut upload: Option<(String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart request: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload.csv").to_string();
            let contents = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read uploaded file: {e}")))?;
            upload = Some((file_name, contents));
        }
    }

    let (file_name, contents) = upload.ok_or_else(|| {
        ApiError::BadRequest("No file provided. Please upload a CSV file.".to_string())
    })?;

    if !file_name.to_lowercase().ends_with(".csv") {
        return Err(ApiError::BadRequest(
            "Invalid file type. Please upload a CSV file.".to_string(),
        ));
    }

    if contents.trim().is_empty() {
        return Err(ApiError::BadRequest("CSV file is empty.".to_string()));
    }

    let reviews = columns::parse_reviews(&contents)?;

    let dataset_id = db::datasets::create_with_reviews(&state.db, &file_name, &reviews).await?;

    info!(
        dataset = %dataset_id,
        file = %file_name,
        reviews = reviews.len(),
        "Dataset uploaded"
    );

    Ok(Json(UploadResponse {
        dataset_id,
        review_count: reviews.len(),
        status: "parsing".to_string(),
    }))
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/api/upload", post(upload_dataset))
}
