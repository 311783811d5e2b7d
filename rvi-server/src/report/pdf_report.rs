//! Battlecard PDF export
//!
//! A4 pages with built-in Helvetica; no font files needed at runtime.
//! Layout follows the dashboard's battlecard: title block, competitor
//! summary, insights with up to three source quotes each, action items.

use chrono::Utc;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};
use rvi_common::db::models::Competitor;
use rvi_common::{Error, Result};

use crate::db::analysis::{ActionItemWithContext, InsightWithQuotes};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

/// Max quotes printed under one insight
const QUOTES_PER_INSIGHT: usize = 3;

/// Render the battlecard PDF as bytes
pub fn render(
    insights: &[InsightWithQuotes],
    competitors: &[Competitor],
    action_items: &[ActionItemWithContext],
    dataset_name: &str,
) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "ReviewIntel Competitive Battlecard",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::Internal(format!("PDF export failed: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::Internal(format!("PDF export failed: {e}")))?;

    let layer = doc.get_page(page).get_layer(layer);
    let mut writer = PdfWriter { doc, layer, y: MARGIN_MM };

    // Title block
    writer.text("ReviewIntel Competitive Battlecard", 20.0, &bold, 0.0);
    writer.advance(10.0);
    writer.set_gray(0.47);
    writer.text(&format!("Generated from: {dataset_name}"), 10.0, &regular, 0.0);
    writer.advance(5.0);
    writer.text(
        &format!("Date: {}", Utc::now().format("%Y-%m-%d")),
        10.0,
        &regular,
        0.0,
    );
    writer.advance(12.0);
    writer.set_gray(0.0);

    // Competitors summary
    writer.text("Competitors Analyzed", 14.0, &bold, 0.0);
    writer.advance(8.0);
    for competitor in competitors {
        writer.ensure_space(15.0);
        let sentiment = sentiment_word(competitor.avg_sentiment);
        writer.text(
            &format!(
                "- {} ({} mentions, {} sentiment)",
                competitor.name, competitor.mention_count, sentiment
            ),
            9.0,
            &regular,
            4.0,
        );
        writer.advance(5.0);
    }
    writer.advance(8.0);

    // Insights
    writer.ensure_space(20.0);
    writer.text("Key Insights", 14.0, &bold, 0.0);
    writer.advance(8.0);
    for insight in insights {
        writer.ensure_space(40.0);

        let confidence = confidence_label(insight.source_quotes.len());
        writer.text(
            &format!(
                "{} [{} Confidence, {} sources]",
                insight.title,
                confidence,
                insight.source_quotes.len()
            ),
            11.0,
            &bold,
            0.0,
        );
        writer.advance(6.0);

        for line in wrap_text(&insight.description, 95) {
            writer.ensure_space(8.0);
            writer.text(&line, 9.0, &regular, 4.0);
            writer.advance(4.0);
        }
        writer.advance(4.0);

        if !insight.source_quotes.is_empty() {
            writer.set_gray(0.31);
            writer.text("Sources:", 8.0, &regular, 4.0);
            writer.advance(4.0);

            for quote in insight.source_quotes.iter().take(QUOTES_PER_INSIGHT) {
                writer.ensure_space(15.0);
                let attribution = format!(
                    "\"{}\" ({}, {}, {}/5, {})",
                    quote.quote_text,
                    quote.product_name,
                    quote.platform,
                    quote.rating,
                    quote.review_date
                );
                for line in wrap_text(&attribution, 105) {
                    writer.ensure_space(6.0);
                    writer.text(&line, 8.0, &regular, 8.0);
                    writer.advance(3.5);
                }
                writer.advance(2.0);
            }
            writer.set_gray(0.0);
        }

        writer.advance(6.0);
    }

    // Action items
    writer.ensure_space(20.0);
    writer.text("Action Items", 14.0, &bold, 0.0);
    writer.advance(8.0);
    for item in action_items {
        writer.ensure_space(20.0);
        writer.text(
            &format!("[{}] {}", item.priority.to_uppercase(), item.title),
            10.0,
            &bold,
            0.0,
        );
        writer.advance(5.0);
        for line in wrap_text(&item.description, 95) {
            writer.ensure_space(8.0);
            writer.text(&line, 9.0, &regular, 4.0);
            writer.advance(4.0);
        }
        writer.advance(6.0);
    }

    writer
        .doc
        .save_to_bytes()
        .map_err(|e| Error::Internal(format!("PDF export failed: {e}")))
}

/// Tracks the current page/layer and the cursor measured from the top edge
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PdfWriter {
    fn text(&mut self, text: &str, size: f32, font: &IndirectFontRef, indent: f32) {
        self.layer.use_text(
            text,
            size,
            Mm(MARGIN_MM + indent),
            Mm(PAGE_HEIGHT_MM - self.y),
            font,
        );
    }

    fn advance(&mut self, delta: f32) {
        self.y += delta;
    }

    /// Start a fresh page when fewer than `needed` millimeters remain
    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_HEIGHT_MM - MARGIN_MM {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = MARGIN_MM;
        }
    }

    fn set_gray(&self, value: f32) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(value, value, value, None)));
    }
}

fn sentiment_word(avg_sentiment: f64) -> &'static str {
    if avg_sentiment > 0.3 {
        "Positive"
    } else if avg_sentiment < -0.3 {
        "Negative"
    } else {
        "Mixed"
    }
}

fn confidence_label(quote_count: usize) -> &'static str {
    if quote_count >= 5 {
        "High"
    } else if quote_count >= 2 {
        "Medium"
    } else {
        "Low"
    }
}

/// Word-based line wrapping; overlong single words get their own line
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_word_thresholds() {
        assert_eq!(sentiment_word(0.5), "Positive");
        assert_eq!(sentiment_word(0.3), "Mixed");
        assert_eq!(sentiment_word(-0.3), "Mixed");
        assert_eq!(sentiment_word(-0.6), "Negative");
    }

    #[test]
    fn confidence_label_thresholds() {
        assert_eq!(confidence_label(6), "High");
        assert_eq!(confidence_label(5), "High");
        assert_eq!(confidence_label(2), "Medium");
        assert_eq!(confidence_label(1), "Low");
        assert_eq!(confidence_label(0), "Low");
    }

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("one two three four five six seven", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "one two three four five six seven");
    }

    #[test]
    fn wrap_text_of_empty_string_is_one_empty_line() {
        assert_eq!(wrap_text("", 80), vec![String::new()]);
    }

    #[test]
    fn renders_a_nonempty_document() {
        let bytes = render(&[], &[], &[], "reviews.csv").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
