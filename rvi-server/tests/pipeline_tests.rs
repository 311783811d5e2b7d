//! End-to-end pipeline tests against a stubbed Gemini endpoint
//!
//! The client's endpoint is configurable, so these tests stand up a local
//! HTTP server that answers `generateContent` with canned payloads and
//! drive the full pipeline: status transitions, persistence, index
//! linking, and terminal error states.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use rvi_common::config::GeminiConfig;
use rvi_server::engine::{run_full_pipeline, GeminiClient};

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should create in-memory pool");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("Should enable foreign keys");

    rvi_common::db::create_tables(&pool)
        .await
        .expect("Should create schema");

    pool
}

async fn seed_dataset_with_reviews(pool: &SqlitePool, dataset: &str, texts: &[&str]) {
    sqlx::query("INSERT INTO datasets (guid, name, status) VALUES (?, 'reviews.csv', 'parsing')")
        .bind(dataset)
        .execute(pool)
        .await
        .expect("Should seed dataset");

    for (i, text) in texts.iter().enumerate() {
        sqlx::query(
            "INSERT INTO reviews (guid, dataset_guid, review_text, rating, review_date, platform, reviewer_name, reviewer_role, product_name, review_url) \
             VALUES (?, ?, ?, 3, '2024-01-15', 'G2', 'Anonymous', '', 'Workday', '')",
        )
        .bind(format!("r-{i}"))
        .bind(dataset)
        .bind(text)
        .execute(pool)
        .await
        .expect("Should seed review");
    }
}

/// Serve canned Gemini responses on an ephemeral port, return the base URL
async fn spawn_gemini_stub(response: Value, status: StatusCode) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind stub listener");
    let addr = listener.local_addr().expect("Should have local addr");

    let app = Router::new().route(
        "/v1beta/models/:call",
        post(move || {
            let response = response.clone();
            async move { (status, Json(response)) }
        }),
    );

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub should serve");
    });

    format!("http://{addr}")
}

fn stub_config(endpoint: String) -> GeminiConfig {
    GeminiConfig {
        api_key: "AIzaSyTestKey1234567890".to_string(),
        model: "gemini-3-flash-preview".to_string(),
        endpoint,
        timeout_secs: 5,
    }
}

/// Wrap an analysis JSON object the way generateContent returns it:
/// as text inside the first candidate part.
fn gemini_payload(analysis: Value) -> Value {
    json!({
        "candidates": [
            {"content": {"parts": [{"text": analysis.to_string()}]}}
        ]
    })
}

#[tokio::test]
async fn test_pipeline_persists_full_analysis() {
    let pool = setup_test_db().await;
    seed_dataset_with_reviews(
        &pool,
        "d-1",
        &["Support takes weeks to reply", "Reporting is excellent"],
    )
    .await;

    let analysis = json!({
        "competitors": [{
            "name": "Workday",
            "mentionCount": 2,
            "avgSentiment": -0.4,
            "praiseThemes": ["Reporting"],
            "complaintThemes": ["Slow support"]
        }],
        "insights": [{
            "title": "Support response times drive churn",
            "description": "Several reviewers cite multi-week support queues.",
            "category": "churn_driver",
            "impact": "high",
            "confidenceScore": 0.9,
            // index 5 is out of range and must be skipped
            "sourceReviewIndices": [0, 5]
        }],
        "actionItems": [
            {
                "title": "Staff up support",
                "description": "Cut first-response time below one day.",
                "priority": "high",
                "relatedInsightIndex": 0
            },
            {
                "title": "Orphan item",
                "description": "",
                "priority": "low",
                "relatedInsightIndex": 7
            }
        ]
    });

    let endpoint = spawn_gemini_stub(gemini_payload(analysis), StatusCode::OK).await;
    let client = GeminiClient::new(&stub_config(endpoint)).expect("Should build client");

    let summary = run_full_pipeline(&pool, &client, "d-1")
        .await
        .expect("Pipeline should succeed");

    assert_eq!(summary.insight_count, 1);
    assert_eq!(summary.competitor_count, 1);
    assert_eq!(summary.action_item_count, 2);

    let status: String = sqlx::query_scalar("SELECT status FROM datasets WHERE guid = 'd-1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "complete");

    // Out-of-range review index skipped: exactly one claim + quote link
    let (claims, quotes): (i64, i64) = (
        sqlx::query_scalar("SELECT COUNT(*) FROM claims")
            .fetch_one(&pool)
            .await
            .unwrap(),
        sqlx::query_scalar("SELECT COUNT(*) FROM insight_source_quotes")
            .fetch_one(&pool)
            .await
            .unwrap(),
    );
    assert_eq!(claims, 1);
    assert_eq!(quotes, 1);

    let (claim_review, claim_confidence): (String, String) =
        sqlx::query_as("SELECT review_guid, confidence FROM claims")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(claim_review, "r-0");
    assert_eq!(claim_confidence, "high"); // 0.9 > 0.7

    // First action item linked to the insight, the orphan left unlinked
    let links: Vec<(String, Option<String>)> =
        sqlx::query_as("SELECT title, insight_theme_guid FROM action_items ORDER BY title")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].0, "Orphan item");
    assert!(links[0].1.is_none());
    assert_eq!(links[1].0, "Staff up support");
    assert!(links[1].1.is_some());
}

#[tokio::test]
async fn test_pipeline_whitelists_model_enums() {
    let pool = setup_test_db().await;
    seed_dataset_with_reviews(&pool, "d-1", &["Pricing doubled this year"]).await;

    let analysis = json!({
        "insights": [{
            "title": "Pricing pressure",
            "category": "totally_new_category",
            "impact": "apocalyptic",
            "confidenceScore": 3.2,
            "sourceReviewIndices": [0]
        }]
    });

    let endpoint = spawn_gemini_stub(gemini_payload(analysis), StatusCode::OK).await;
    let client = GeminiClient::new(&stub_config(endpoint)).expect("Should build client");

    run_full_pipeline(&pool, &client, "d-1")
        .await
        .expect("Pipeline should succeed");

    let (category, impact, confidence): (String, String, f64) = sqlx::query_as(
        "SELECT category, impact, confidence_score FROM insight_themes",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(category, "feature_gap");
    assert_eq!(impact, "medium");
    assert_eq!(confidence, 1.0);
}

#[tokio::test]
async fn test_pipeline_marks_error_on_invalid_json() {
    let pool = setup_test_db().await;
    seed_dataset_with_reviews(&pool, "d-1", &["Fine product"]).await;

    let payload = json!({
        "candidates": [
            {"content": {"parts": [{"text": "I am not JSON, sorry"}]}}
        ]
    });
    let endpoint = spawn_gemini_stub(payload, StatusCode::OK).await;
    let client = GeminiClient::new(&stub_config(endpoint)).expect("Should build client");

    let err = run_full_pipeline(&pool, &client, "d-1")
        .await
        .expect_err("Pipeline should fail");
    assert!(err.to_string().contains("invalid JSON"));

    let (status, error_msg): (String, Option<String>) =
        sqlx::query_as("SELECT status, error_msg FROM datasets WHERE guid = 'd-1'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "error");
    assert!(error_msg.unwrap().contains("invalid JSON"));
}

#[tokio::test]
async fn test_pipeline_surfaces_rate_limit() {
    let pool = setup_test_db().await;
    seed_dataset_with_reviews(&pool, "d-1", &["Fine product"]).await;

    let endpoint =
        spawn_gemini_stub(json!({"error": "quota"}), StatusCode::TOO_MANY_REQUESTS).await;
    let client = GeminiClient::new(&stub_config(endpoint)).expect("Should build client");

    let err = run_full_pipeline(&pool, &client, "d-1")
        .await
        .expect_err("Pipeline should fail");
    assert!(err.is_rate_limit());

    let status: String = sqlx::query_scalar("SELECT status FROM datasets WHERE guid = 'd-1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "error");
}

#[tokio::test]
async fn test_pipeline_fails_on_dataset_without_reviews() {
    let pool = setup_test_db().await;
    sqlx::query("INSERT INTO datasets (guid, name, status) VALUES ('d-1', 'empty.csv', 'parsing')")
        .execute(&pool)
        .await
        .unwrap();

    let endpoint = spawn_gemini_stub(gemini_payload(json!({})), StatusCode::OK).await;
    let client = GeminiClient::new(&stub_config(endpoint)).expect("Should build client");

    let err = run_full_pipeline(&pool, &client, "d-1")
        .await
        .expect_err("Pipeline should fail");
    assert!(err.to_string().contains("No reviews"));

    let status: String = sqlx::query_scalar("SELECT status FROM datasets WHERE guid = 'd-1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "error");
}
