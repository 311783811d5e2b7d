//! Full analysis pipeline
//!
//! One run per dataset: mark `analyzing`, load reviews, send the single
//! mega-prompt, normalize the response, persist everything, mark
//! `complete`. Any failure marks the dataset `error` with a message for
//! later display and propagates; recovery is user-initiated.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};

use crate::db;
use crate::engine::gemini::{GeminiClient, GeminiError};
use crate::engine::{normalize, prompt};
use rvi_common::db::models::dataset_status;

/// Counts of stored artifacts, reported back to the caller
#[derive(Debug, Clone, Copy)]
pub struct PipelineSummary {
    pub insight_count: i64,
    pub competitor_count: i64,
    pub action_item_count: i64,
}

/// Terminal pipeline failures
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No reviews found for this dataset.")]
    NoReviews,

    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error("Gemini returned invalid JSON. Please try again.")]
    InvalidResponse,

    #[error(transparent)]
    Common(#[from] rvi_common::Error),
}

impl PipelineError {
    /// Upstream quota exhaustion gets its own HTTP status at the API layer
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, PipelineError::Gemini(GeminiError::RateLimited))
    }
}

/// Run the full analysis pipeline for a dataset.
pub async fn run_full_pipeline(
    pool: &SqlitePool,
    client: &GeminiClient,
    dataset_guid: &str,
) -> Result<PipelineSummary, PipelineError> {
    match run_inner(pool, client, dataset_guid).await {
        Ok(summary) => Ok(summary),
        Err(err) => {
            error!(dataset = %dataset_guid, error = %err, "Analysis pipeline failed");
            // Record the terminal state; the original failure still propagates
            if let Err(db_err) =
                db::datasets::set_error(pool, dataset_guid, &err.to_string()).await
            {
                error!(dataset = %dataset_guid, error = %db_err, "Failed to record error state");
            }
            Err(err)
        }
    }
}

async fn run_inner(
    pool: &SqlitePool,
    client: &GeminiClient,
    dataset_guid: &str,
) -> Result<PipelineSummary, PipelineError> {
    db::datasets::set_status(pool, dataset_guid, dataset_status::ANALYZING).await?;

    let reviews = db::reviews::list_by_dataset(pool, dataset_guid).await?;
    if reviews.is_empty() {
        return Err(PipelineError::NoReviews);
    }

    info!(
        dataset = %dataset_guid,
        reviews = reviews.len(),
        "Starting analysis"
    );

    let inputs = prompt::review_inputs(&reviews);
    let prompt_text = prompt::build_mega_prompt(&inputs)?;

    // The single API call for the whole dataset
    let content = client.generate(&prompt_text).await?;

    let analysis = normalize::parse_analysis(&content).map_err(|parse_err| {
        error!(
            dataset = %dataset_guid,
            error = %parse_err,
            "Failed to parse Gemini response"
        );
        PipelineError::InvalidResponse
    })?;

    info!(
        dataset = %dataset_guid,
        competitors = analysis.competitors.len(),
        insights = analysis.insights.len(),
        action_items = analysis.action_items.len(),
        "Parsed analysis"
    );

    db::analysis::store_analysis(pool, dataset_guid, &analysis, &reviews).await?;
    db::datasets::set_status(pool, dataset_guid, dataset_status::COMPLETE).await?;

    let (insight_count, competitor_count, action_item_count) =
        db::datasets::artifact_counts(pool, dataset_guid).await?;

    info!(
        dataset = %dataset_guid,
        insights = insight_count,
        competitors = competitor_count,
        action_items = action_item_count,
        "Analysis complete"
    );

    Ok(PipelineSummary {
        insight_count,
        competitor_count,
        action_item_count,
    })
}
