//! Analysis artifact persistence and read-back
//!
//! Writes the normalized model output (competitors, insights with their
//! source-quote joins, action items) in one transaction, and serves the
//! dashboard read queries.

use rvi_common::db::models::{ActionItem, Competitor};
use rvi_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::engine::normalize::{claim_confidence, AnalysisResult};

/// Quote text stored on a claim is capped at this many characters
const QUOTE_MAX_CHARS: usize = 500;

/// Persist a normalized analysis for a dataset.
///
/// Source-review indices and insight indices come straight from the model;
/// out-of-range values are skipped (quotes) or left unlinked (action
/// items). In-range indices are trusted as returned.
pub async fn store_analysis(
    pool: &SqlitePool,
    dataset_guid: &str,
    analysis: &AnalysisResult,
    reviews: &[rvi_common::db::models::Review],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    for comp in &analysis.competitors {
        sqlx::query(
            r#"
            INSERT INTO competitors (
                guid, dataset_guid, name, mention_count, avg_sentiment,
                praise_themes, complaint_themes
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(dataset_guid)
        .bind(&comp.name)
        .bind(comp.mention_count)
        .bind(comp.avg_sentiment)
        .bind(themes_json(&comp.praise_themes))
        .bind(themes_json(&comp.complaint_themes))
        .execute(&mut *tx)
        .await?;
    }

    let mut insight_guids = Vec::with_capacity(analysis.insights.len());
    for insight in &analysis.insights {
        let insight_guid = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO insight_themes (
                guid, dataset_guid, title, description, category, impact, confidence_score
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&insight_guid)
        .bind(dataset_guid)
        .bind(&insight.title)
        .bind(&insight.description)
        .bind(&insight.category)
        .bind(&insight.impact)
        .bind(insight.confidence_score)
        .execute(&mut *tx)
        .await?;

        for &review_idx in &insight.source_review_indices {
            if review_idx < 0 || review_idx as usize >= reviews.len() {
                continue;
            }
            let review = &reviews[review_idx as usize];

            let claim_guid = Uuid::new_v4().to_string();
            let quote_text: String = review.review_text.chars().take(QUOTE_MAX_CHARS).collect();

            sqlx::query(
                r#"
                INSERT INTO claims (
                    guid, dataset_guid, review_guid, claim_text, category, quote_text, confidence
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&claim_guid)
            .bind(dataset_guid)
            .bind(&review.guid)
            .bind(&insight.title)
            .bind(&insight.category)
            .bind(&quote_text)
            .bind(claim_confidence(insight.confidence_score))
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO insight_source_quotes (guid, insight_theme_guid, claim_guid, review_guid)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&insight_guid)
            .bind(&claim_guid)
            .bind(&review.guid)
            .execute(&mut *tx)
            .await?;
        }

        insight_guids.push(insight_guid);
    }

    for item in &analysis.action_items {
        let insight_guid = item.related_insight_index.and_then(|idx| {
            if idx >= 0 && (idx as usize) < insight_guids.len() {
                Some(insight_guids[idx as usize].clone())
            } else {
                None
            }
        });

        sqlx::query(
            r#"
            INSERT INTO action_items (
                guid, dataset_guid, insight_theme_guid, title, description, priority, status
            ) VALUES (?, ?, ?, ?, ?, ?, 'not_started')
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(dataset_guid)
        .bind(insight_guid)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.priority)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

fn themes_json(themes: &[String]) -> String {
    serde_json::to_string(themes).unwrap_or_else(|_| "[]".to_string())
}

/// A source quote joined with its claim and review metadata
#[derive(Debug, Clone, Serialize)]
pub struct SourceQuoteRow {
    pub id: String,
    pub quote_text: String,
    pub claim_text: String,
    pub review_date: String,
    pub platform: String,
    pub rating: f64,
    pub reviewer_name: String,
    pub reviewer_role: String,
    pub product_name: String,
    pub review_url: String,
}

/// An insight theme with its source quotes attached
#[derive(Debug, Clone, Serialize)]
pub struct InsightWithQuotes {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub impact: String,
    pub confidence_score: f64,
    pub source_quotes: Vec<SourceQuoteRow>,
}

/// An action item joined with its related insight summary and quotes
#[derive(Debug, Clone, Serialize)]
pub struct ActionItemWithContext {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub insight_title: Option<String>,
    pub insight_description: Option<String>,
    pub insight_category: Option<String>,
    pub confidence_score: f64,
    pub source_quotes: Vec<SourceQuoteRow>,
}

/// Fetch a dataset's competitors, most-mentioned first
pub async fn fetch_competitors(pool: &SqlitePool, dataset_guid: &str) -> Result<Vec<Competitor>> {
    let rows = sqlx::query_as::<_, (String, String, i64, f64, String, String)>(
        r#"
        SELECT guid, name, mention_count, avg_sentiment, praise_themes, complaint_themes
        FROM competitors
        WHERE dataset_guid = ?
        ORDER BY mention_count DESC
        "#,
    )
    .bind(dataset_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(guid, name, mention_count, avg_sentiment, praise, complaints)| Competitor {
                guid,
                dataset_guid: dataset_guid.to_string(),
                name,
                mention_count,
                avg_sentiment,
                praise_themes: serde_json::from_str(&praise).unwrap_or_default(),
                complaint_themes: serde_json::from_str(&complaints).unwrap_or_default(),
            },
        )
        .collect())
}

/// Fetch a dataset's insights with source quotes, highest confidence first
pub async fn fetch_insights(pool: &SqlitePool, dataset_guid: &str) -> Result<Vec<InsightWithQuotes>> {
    let rows = sqlx::query_as::<_, (String, String, String, String, String, f64)>(
        r#"
        SELECT guid, title, description, category, impact, confidence_score
        FROM insight_themes
        WHERE dataset_guid = ?
        ORDER BY confidence_score DESC
        "#,
    )
    .bind(dataset_guid)
    .fetch_all(pool)
    .await?;

    let mut insights = Vec::with_capacity(rows.len());
    for (guid, title, description, category, impact, confidence_score) in rows {
        let source_quotes = fetch_source_quotes(pool, &guid).await?;
        insights.push(InsightWithQuotes {
            id: guid,
            title,
            description,
            category,
            impact,
            confidence_score,
            source_quotes,
        });
    }

    Ok(insights)
}

/// Fetch the source quotes backing one insight
async fn fetch_source_quotes(
    pool: &SqlitePool,
    insight_theme_guid: &str,
) -> Result<Vec<SourceQuoteRow>> {
    let rows = sqlx::query_as::<
        _,
        (
            String,
            String,
            String,
            String,
            String,
            f64,
            String,
            String,
            String,
            String,
        ),
    >(
        r#"
        SELECT sq.guid, c.quote_text, c.claim_text, r.review_date, r.platform,
               r.rating, r.reviewer_name, r.reviewer_role, r.product_name, r.review_url
        FROM insight_source_quotes sq
        JOIN claims c ON c.guid = sq.claim_guid
        JOIN reviews r ON r.guid = sq.review_guid
        WHERE sq.insight_theme_guid = ?
        ORDER BY sq.rowid
        "#,
    )
    .bind(insight_theme_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id,
                quote_text,
                claim_text,
                review_date,
                platform,
                rating,
                reviewer_name,
                reviewer_role,
                product_name,
                review_url,
            )| SourceQuoteRow {
                id,
                quote_text,
                claim_text,
                review_date,
                platform,
                rating,
                reviewer_name,
                reviewer_role,
                product_name,
                review_url,
            },
        )
        .collect())
}

/// Fetch a dataset's action items with related insight context
pub async fn fetch_action_items(
    pool: &SqlitePool,
    dataset_guid: &str,
) -> Result<Vec<ActionItemWithContext>> {
    let rows = sqlx::query_as::<
        _,
        (
            String,
            String,
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<f64>,
        ),
    >(
        r#"
        SELECT a.guid, a.title, a.description, a.priority, a.status,
               a.insight_theme_guid, t.title, t.description, t.category, t.confidence_score
        FROM action_items a
        LEFT JOIN insight_themes t ON t.guid = a.insight_theme_guid
        WHERE a.dataset_guid = ?
        ORDER BY a.priority, a.status
        "#,
    )
    .bind(dataset_guid)
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (
        guid,
        title,
        description,
        priority,
        status,
        insight_theme_guid,
        insight_title,
        insight_description,
        insight_category,
        confidence_score,
    ) in rows
    {
        let source_quotes = match &insight_theme_guid {
            Some(insight_guid) => fetch_source_quotes(pool, insight_guid).await?,
            None => Vec::new(),
        };

        items.push(ActionItemWithContext {
            id: guid,
            title,
            description,
            priority,
            status,
            insight_title,
            insight_description,
            insight_category,
            confidence_score: confidence_score.unwrap_or(0.0),
            source_quotes,
        });
    }

    Ok(items)
}

/// Update an action item's lifecycle status.
///
/// Returns `None` when no row matches the guid.
pub async fn update_action_item_status(
    pool: &SqlitePool,
    guid: &str,
    status: &str,
) -> Result<Option<ActionItem>> {
    let result = sqlx::query("UPDATE action_items SET status = ? WHERE guid = ?")
        .bind(status)
        .bind(guid)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query_as::<
        _,
        (
            String,
            String,
            Option<String>,
            String,
            String,
            String,
            String,
        ),
    >(
        r#"
        SELECT guid, dataset_guid, insight_theme_guid, title, description, priority, status
        FROM action_items
        WHERE guid = ?
        "#,
    )
    .bind(guid)
    .fetch_one(pool)
    .await?;

    let (guid, dataset_guid, insight_theme_guid, title, description, priority, status) = row;
    Ok(Some(ActionItem {
        guid,
        dataset_guid,
        insight_theme_guid,
        title,
        description,
        priority,
        status,
    }))
}
