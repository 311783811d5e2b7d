//! Flat CSV export
//!
//! One row per insight x source quote (a single bare row when an insight
//! has no quotes), followed by competitor and action-item rows. Quoting
//! is left to the csv writer.

use rvi_common::db::models::Competitor;
use rvi_common::{Error, Result};

use crate::db::analysis::{ActionItemWithContext, InsightWithQuotes};

const HEADER: [&str; 11] = [
    "Type",
    "Title",
    "Description",
    "Category",
    "Impact",
    "Confidence",
    "Source Quote",
    "Source Platform",
    "Source Rating",
    "Source Date",
    "Source Product",
];

/// Render the export CSV as bytes
pub fn render(
    insights: &[InsightWithQuotes],
    competitors: &[Competitor],
    action_items: &[ActionItemWithContext],
) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| Error::Internal(format!("CSV export failed: {e}")))?;

    for insight in insights {
        if insight.source_quotes.is_empty() {
            write_row(
                &mut writer,
                [
                    "Insight",
                    &insight.title,
                    &insight.description,
                    &insight.category,
                    &insight.impact,
                    &insight.confidence_score.to_string(),
                    "",
                    "",
                    "",
                    "",
                    "",
                ],
            )?;
        } else {
            for quote in &insight.source_quotes {
                write_row(
                    &mut writer,
                    [
                        "Insight",
                        &insight.title,
                        &insight.description,
                        &insight.category,
                        &insight.impact,
                        &insight.confidence_score.to_string(),
                        &quote.quote_text,
                        &quote.platform,
                        &quote.rating.to_string(),
                        &quote.review_date,
                        &quote.product_name,
                    ],
                )?;
            }
        }
    }

    for competitor in competitors {
        write_row(
            &mut writer,
            [
                "Competitor",
                &competitor.name,
                &format!("{} mentions", competitor.mention_count),
                "",
                "",
                &competitor.avg_sentiment.to_string(),
                "",
                "",
                "",
                "",
                "",
            ],
        )?;
    }

    for item in action_items {
        write_row(
            &mut writer,
            [
                "Action Item",
                &item.title,
                &item.description,
                "",
                &item.priority,
                "",
                "",
                "",
                "",
                "",
                "",
            ],
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("CSV export failed: {e}")))
}

fn write_row(writer: &mut csv::Writer<Vec<u8>>, fields: [&str; 11]) -> Result<()> {
    writer
        .write_record(fields)
        .map_err(|e| Error::Internal(format!("CSV export failed: {e}")))
}
