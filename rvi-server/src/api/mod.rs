//! HTTP API handlers for rvi-server

pub mod action_items;
pub mod analyze;
pub mod competitors;
pub mod export;
pub mod health;
pub mod insights;
pub mod upload;

pub use action_items::action_item_routes;
pub use analyze::analyze_routes;
pub use competitors::competitor_routes;
pub use export::export_routes;
pub use health::health_routes;
pub use insights::insight_routes;
pub use upload::upload_routes;

use crate::{ApiError, ApiResult};
use serde::Deserialize;

/// Query string shared by the dashboard read endpoints
#[derive(Debug, Deserialize)]
pub struct DatasetQuery {
    pub dataset_id: Option<String>,
}

impl DatasetQuery {
    /// Extract the dataset id or fail with a 400
    pub fn require(self) -> ApiResult<String> {
        self.dataset_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing dataset_id parameter.".to_string()))
    }
}
