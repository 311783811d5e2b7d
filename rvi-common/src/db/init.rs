//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates all tables
//! idempotently. Safe to call on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_connection(&pool).await?;
    create_tables(&pool).await?;

    Ok(pool)
}

/// Apply connection-level PRAGMAs
async fn configure_connection(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL mode allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_datasets_table(pool).await?;
    create_reviews_table(pool).await?;
    create_competitors_table(pool).await?;
    create_insight_themes_table(pool).await?;
    create_claims_table(pool).await?;
    create_insight_source_quotes_table(pool).await?;
    create_action_items_table(pool).await?;

    Ok(())
}

async fn create_datasets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS datasets (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'parsing',
            error_msg TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            guid TEXT PRIMARY KEY,
            dataset_guid TEXT NOT NULL REFERENCES datasets(guid) ON DELETE CASCADE,
            review_text TEXT NOT NULL,
            rating REAL NOT NULL DEFAULT 3,
            review_date TEXT NOT NULL DEFAULT '',
            platform TEXT NOT NULL DEFAULT 'Unknown',
            reviewer_name TEXT NOT NULL DEFAULT 'Anonymous',
            reviewer_role TEXT NOT NULL DEFAULT '',
            product_name TEXT NOT NULL DEFAULT 'Unknown Product',
            review_url TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_dataset ON reviews(dataset_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_competitors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS competitors (
            guid TEXT PRIMARY KEY,
            dataset_guid TEXT NOT NULL REFERENCES datasets(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            mention_count INTEGER NOT NULL DEFAULT 1,
            avg_sentiment REAL NOT NULL DEFAULT 0,
            praise_themes TEXT NOT NULL DEFAULT '[]',
            complaint_themes TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_competitors_dataset ON competitors(dataset_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_insight_themes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS insight_themes (
            guid TEXT PRIMARY KEY,
            dataset_guid TEXT NOT NULL REFERENCES datasets(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT 'feature_gap',
            impact TEXT NOT NULL DEFAULT 'medium',
            confidence_score REAL NOT NULL DEFAULT 0.5,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_insight_themes_dataset ON insight_themes(dataset_guid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_claims_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS claims (
            guid TEXT PRIMARY KEY,
            dataset_guid TEXT NOT NULL REFERENCES datasets(guid) ON DELETE CASCADE,
            review_guid TEXT NOT NULL REFERENCES reviews(guid) ON DELETE CASCADE,
            claim_text TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'feature_gap',
            quote_text TEXT NOT NULL DEFAULT '',
            confidence TEXT NOT NULL DEFAULT 'medium',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_insight_source_quotes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS insight_source_quotes (
            guid TEXT PRIMARY KEY,
            insight_theme_guid TEXT NOT NULL REFERENCES insight_themes(guid) ON DELETE CASCADE,
            claim_guid TEXT NOT NULL REFERENCES claims(guid) ON DELETE CASCADE,
            review_guid TEXT NOT NULL REFERENCES reviews(guid) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_source_quotes_insight ON insight_source_quotes(insight_theme_guid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_action_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS action_items (
            guid TEXT PRIMARY KEY,
            dataset_guid TEXT NOT NULL REFERENCES datasets(guid) ON DELETE CASCADE,
            insight_theme_guid TEXT REFERENCES insight_themes(guid) ON DELETE SET NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            priority TEXT NOT NULL DEFAULT 'medium',
            status TEXT NOT NULL DEFAULT 'not_started',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_action_items_dataset ON action_items(dataset_guid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        // A pool of one connection keeps the in-memory database alive and shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        configure_connection(&pool).await.expect("pragmas");
        create_tables(&pool).await.expect("schema");
        pool
    }

    #[tokio::test]
    async fn create_tables_is_idempotent() {
        let pool = memory_pool().await;
        create_tables(&pool).await.expect("second run");
    }

    #[tokio::test]
    async fn dataset_insert_and_read_roundtrip() {
        let pool = memory_pool().await;

        sqlx::query("INSERT INTO datasets (guid, name, status) VALUES (?, ?, ?)")
            .bind("d-1")
            .bind("reviews.csv")
            .bind("parsing")
            .execute(&pool)
            .await
            .expect("insert");

        let (name, status): (String, String) =
            sqlx::query_as("SELECT name, status FROM datasets WHERE guid = ?")
                .bind("d-1")
                .fetch_one(&pool)
                .await
                .expect("select");

        assert_eq!(name, "reviews.csv");
        assert_eq!(status, "parsing");
    }

    #[tokio::test]
    async fn deleting_dataset_cascades_to_reviews() {
        let pool = memory_pool().await;

        sqlx::query("INSERT INTO datasets (guid, name) VALUES ('d-1', 'f.csv')")
            .execute(&pool)
            .await
            .expect("dataset");
        sqlx::query(
            "INSERT INTO reviews (guid, dataset_guid, review_text) VALUES ('r-1', 'd-1', 'Great')",
        )
        .execute(&pool)
        .await
        .expect("review");

        sqlx::query("DELETE FROM datasets WHERE guid = 'd-1'")
            .execute(&pool)
            .await
            .expect("delete");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 0);
    }
}
