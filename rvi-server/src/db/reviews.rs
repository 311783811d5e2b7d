//! Review persistence

use rvi_common::db::models::Review;
use rvi_common::Result;
use sqlx::SqlitePool;

/// Load a dataset's reviews in insertion order.
///
/// The order matters: prompt indices and the response's index
/// cross-references both assume this ordering.
pub async fn list_by_dataset(pool: &SqlitePool, dataset_guid: &str) -> Result<Vec<Review>> {
    let rows = sqlx::query_as::<
        _,
        (
            String,
            String,
            String,
            f64,
            String,
            String,
            String,
            String,
            String,
            String,
        ),
    >(
        r#"
        SELECT guid, dataset_guid, review_text, rating, review_date,
               platform, reviewer_name, reviewer_role, product_name, review_url
        FROM reviews
        WHERE dataset_guid = ?
        ORDER BY rowid
        "#,
    )
    .bind(dataset_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                guid,
                dataset_guid,
                review_text,
                rating,
                review_date,
                platform,
                reviewer_name,
                reviewer_role,
                product_name,
                review_url,
            )| Review {
                guid,
                dataset_guid,
                review_text,
                rating,
                review_date,
                platform,
                reviewer_name,
                reviewer_role,
                product_name,
                review_url,
            },
        )
        .collect())
}
