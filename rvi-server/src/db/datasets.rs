//! Dataset persistence

use rvi_common::db::models::Dataset;
use rvi_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::engine::columns::ParsedReview;

/// Insert a dataset and its parsed reviews in one transaction.
///
/// Returns the new dataset guid. The dataset starts in `parsing` status.
pub async fn create_with_reviews(
    pool: &SqlitePool,
    name: &str,
    reviews: &[ParsedReview],
) -> Result<String> {
    let dataset_guid = Uuid::new_v4().to_string();

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO datasets (guid, name, status) VALUES (?, ?, 'parsing')")
        .bind(&dataset_guid)
        .bind(name)
        .execute(&mut *tx)
        .await?;

    for review in reviews {
        sqlx::query(
            r#"
            INSERT INTO reviews (
                guid, dataset_guid, review_text, rating, review_date,
                platform, reviewer_name, reviewer_role, product_name, review_url
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&dataset_guid)
        .bind(&review.review_text)
        .bind(review.rating)
        .bind(&review.review_date)
        .bind(&review.platform)
        .bind(&review.reviewer_name)
        .bind(&review.reviewer_role)
        .bind(&review.product_name)
        .bind(&review.review_url)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(dataset_guid)
}

/// Load a dataset by guid
pub async fn get(pool: &SqlitePool, guid: &str) -> Result<Option<Dataset>> {
    let row = sqlx::query_as::<_, (String, String, String, Option<String>)>(
        "SELECT guid, name, status, error_msg FROM datasets WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(guid, name, status, error_msg)| Dataset {
        guid,
        name,
        status,
        error_msg,
    }))
}

/// Set the dataset status, clearing any previous error message
pub async fn set_status(pool: &SqlitePool, guid: &str, status: &str) -> Result<()> {
    sqlx::query("UPDATE datasets SET status = ?, error_msg = NULL WHERE guid = ?")
        .bind(status)
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

/// Mark the dataset failed with a human-readable message for later display
pub async fn set_error(pool: &SqlitePool, guid: &str, message: &str) -> Result<()> {
    sqlx::query("UPDATE datasets SET status = 'error', error_msg = ? WHERE guid = ?")
        .bind(message)
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

/// Count of stored analysis artifacts: (insights, competitors, action items)
pub async fn artifact_counts(pool: &SqlitePool, guid: &str) -> Result<(i64, i64, i64)> {
    let insights: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM insight_themes WHERE dataset_guid = ?")
            .bind(guid)
            .fetch_one(pool)
            .await?;

    let competitors: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM competitors WHERE dataset_guid = ?")
            .bind(guid)
            .fetch_one(pool)
            .await?;

    let action_items: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM action_items WHERE dataset_guid = ?")
            .bind(guid)
            .fetch_one(pool)
            .await?;

    Ok((insights, competitors, action_items))
}
