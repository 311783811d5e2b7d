//! rvi-server library - ReviewIntel HTTP service
//!
//! Exposes the router and application state for integration testing.

pub mod api;
pub mod db;
pub mod engine;
pub mod error;
pub mod report;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use rvi_common::config::GeminiConfig;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Gemini credentials/model; key validity is checked per analyze request
    pub gemini: GeminiConfig,
}

impl AppState {
    pub fn new(db: SqlitePool, gemini: GeminiConfig) -> Self {
        Self { db, gemini }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::upload_routes())
        .merge(api::analyze_routes())
        .merge(api::insight_routes())
        .merge(api::competitor_routes())
        .merge(api::action_item_routes())
        .merge(api::export_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
