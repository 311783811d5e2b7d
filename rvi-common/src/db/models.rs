//! Database row models

use serde::{Deserialize, Serialize};

/// Dataset lifecycle states, stored as TEXT
pub mod dataset_status {
    pub const PARSING: &str = "parsing";
    pub const ANALYZING: &str = "analyzing";
    pub const COMPLETE: &str = "complete";
    pub const ERROR: &str = "error";
}

/// Action item lifecycle states, stored as TEXT
pub const ACTION_ITEM_STATUSES: [&str; 3] = ["not_started", "in_progress", "complete"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub guid: String,
    pub name: String,
    pub status: String,
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub guid: String,
    pub dataset_guid: String,
    pub review_text: String,
    pub rating: f64,
    pub review_date: String,
    pub platform: String,
    pub reviewer_name: String,
    pub reviewer_role: String,
    pub product_name: String,
    pub review_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub guid: String,
    pub dataset_guid: String,
    pub name: String,
    pub mention_count: i64,
    pub avg_sentiment: f64,
    pub praise_themes: Vec<String>,
    pub complaint_themes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightTheme {
    pub guid: String,
    pub dataset_guid: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub impact: String,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub guid: String,
    pub dataset_guid: String,
    pub review_guid: String,
    pub claim_text: String,
    pub category: String,
    pub quote_text: String,
    pub confidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub guid: String,
    pub dataset_guid: String,
    pub insight_theme_guid: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
}
