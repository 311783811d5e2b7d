//! CSV column mapping for review exports
//!
//! Three header dialects are recognized: the generic snake_case layout,
//! Capterra exports, and G2 exports. Detection is case-insensitive over
//! trimmed header names, in that priority order, with the generic layout
//! as fallback.

use chrono::Utc;
use rvi_common::{Error, Result};
use std::collections::HashSet;

/// Header names for one CSV dialect
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub review_text: &'static str,
    pub rating: &'static str,
    pub review_date: &'static str,
    pub platform: &'static str,
    pub reviewer_name: &'static str,
    pub reviewer_role: &'static str,
    pub product_name: &'static str,
    pub review_url: &'static str,
}

pub const STANDARD_COLUMNS: ColumnMap = ColumnMap {
    review_text: "review_text",
    rating: "rating",
    review_date: "review_date",
    platform: "platform",
    reviewer_name: "reviewer_name",
    reviewer_role: "reviewer_role",
    product_name: "product_name",
    review_url: "review_url",
};

pub const CAPTERRA_COLUMNS: ColumnMap = ColumnMap {
    review_text: "Review",
    rating: "Overall Rating",
    review_date: "Date",
    platform: "platform",
    reviewer_name: "Reviewer",
    reviewer_role: "Role",
    product_name: "Product",
    review_url: "URL",
};

pub const G2_COLUMNS: ColumnMap = ColumnMap {
    review_text: "Review Text",
    rating: "Star Rating",
    review_date: "Review Date",
    platform: "platform",
    reviewer_name: "Reviewer Name",
    reviewer_role: "Reviewer Role",
    product_name: "Product Name",
    review_url: "Review URL",
};

/// One normalized review extracted from the CSV
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReview {
    pub review_text: String,
    pub rating: f64,
    pub review_date: String,
    pub platform: String,
    pub reviewer_name: String,
    pub reviewer_role: String,
    pub product_name: String,
    pub review_url: String,
}

/// Pick the column map matching the file's headers
pub fn detect_column_map(headers: &[String]) -> &'static ColumnMap {
    let h: HashSet<String> = headers.iter().map(|s| s.trim().to_lowercase()).collect();

    if h.contains("review_text") && h.contains("rating") {
        return &STANDARD_COLUMNS;
    }
    if h.contains("overall rating") || h.contains("review") {
        return &CAPTERRA_COLUMNS;
    }
    if h.contains("star rating") || h.contains("review text") {
        return &G2_COLUMNS;
    }
    &STANDARD_COLUMNS // fallback
}

/// Look up a field by exact header name, then by case-insensitive trimmed
/// scan. Absent or blank values yield the fallback.
fn get_field(headers: &[String], record: &csv::StringRecord, key: &str, fallback: &str) -> String {
    if let Some(idx) = headers.iter().position(|h| h == key) {
        if let Some(value) = record.get(idx) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }

    let key_lower = key.trim().to_lowercase();
    for (idx, header) in headers.iter().enumerate() {
        if header.trim().to_lowercase() == key_lower {
            if let Some(value) = record.get(idx) {
                let value = value.trim();
                if !value.is_empty() {
                    return value.to_string();
                }
            }
        }
    }

    fallback.to_string()
}

/// Lenient rating parse: numeric prefix ("4 stars" -> 4.0), clamped to [1,5],
/// defaulting to 3 when nothing parses.
fn parse_rating(raw: &str) -> f64 {
    let numeric: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    numeric.parse::<f64>().unwrap_or(3.0).clamp(1.0, 5.0)
}

/// Parse CSV content into normalized reviews.
///
/// Rows without review text are dropped. Errors if the file has no data
/// rows at all, or no rows with review text after filtering.
pub fn parse_reviews(csv_content: &str) -> Result<Vec<ParsedReview>> {
    let csv_content = csv_content.trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::InvalidInput(format!("Failed to parse CSV: {e}")))?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| Error::InvalidInput(format!("Failed to parse CSV: {e}")))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(Error::InvalidInput(
            "CSV file is empty or has no valid rows.".to_string(),
        ));
    }

    let col_map = detect_column_map(&headers);
    let today = Utc::now().format("%Y-%m-%d").to_string();

    let mut reviews = Vec::new();
    for record in &records {
        let review_text = get_field(&headers, record, col_map.review_text, "");
        if review_text.is_empty() {
            continue;
        }

        let rating = parse_rating(&get_field(&headers, record, col_map.rating, "3"));

        reviews.push(ParsedReview {
            review_text,
            rating,
            review_date: get_field(&headers, record, col_map.review_date, &today),
            platform: get_field(&headers, record, col_map.platform, "Unknown"),
            reviewer_name: get_field(&headers, record, col_map.reviewer_name, "Anonymous"),
            reviewer_role: get_field(&headers, record, col_map.reviewer_role, ""),
            product_name: get_field(&headers, record, col_map.product_name, "Unknown Product"),
            review_url: get_field(&headers, record, col_map.review_url, ""),
        });
    }

    if reviews.is_empty() {
        return Err(Error::InvalidInput(
            "No valid reviews found. Ensure your CSV has a column for review text \
             (e.g., 'review_text', 'Review', or 'Review Text')."
                .to_string(),
        ));
    }

    Ok(reviews)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn detects_standard_dialect() {
        let h = headers(&["review_text", "rating", "platform"]);
        let map = detect_column_map(&h);
        assert_eq!(map.review_text, "review_text");
    }

    #[test]
    fn detects_capterra_dialect() {
        let h = headers(&["Review", "Overall Rating", "Date"]);
        let map = detect_column_map(&h);
        assert_eq!(map.review_text, "Review");
    }

    #[test]
    fn detects_g2_dialect() {
        let h = headers(&["Review Text", "Star Rating"]);
        let map = detect_column_map(&h);
        assert_eq!(map.review_text, "Review Text");
    }

    #[test]
    fn falls_back_to_standard_dialect() {
        let h = headers(&["something", "else"]);
        let map = detect_column_map(&h);
        assert_eq!(map.review_text, "review_text");
    }

    #[test]
    fn parses_standard_csv_with_all_fields() {
        let csv = "review_text,rating,review_date,platform,reviewer_name,reviewer_role,product_name,review_url\n\
                   Great tool,4.5,2024-01-15,G2,Jane,Manager,Workday,https://example.com/r/1\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(reviews.len(), 1);
        let r = &reviews[0];
        assert_eq!(r.review_text, "Great tool");
        assert_eq!(r.rating, 4.5);
        assert_eq!(r.review_date, "2024-01-15");
        assert_eq!(r.platform, "G2");
        assert_eq!(r.reviewer_name, "Jane");
        assert_eq!(r.reviewer_role, "Manager");
        assert_eq!(r.product_name, "Workday");
        assert_eq!(r.review_url, "https://example.com/r/1");
    }

    #[test]
    fn parses_capterra_csv_with_defaults() {
        let csv = "Review,Overall Rating,Date\nSolid HR suite,5,2024-02-01\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(reviews.len(), 1);
        let r = &reviews[0];
        assert_eq!(r.review_text, "Solid HR suite");
        assert_eq!(r.rating, 5.0);
        assert_eq!(r.platform, "Unknown");
        assert_eq!(r.reviewer_name, "Anonymous");
        assert_eq!(r.reviewer_role, "");
        assert_eq!(r.product_name, "Unknown Product");
        assert_eq!(r.review_url, "");
    }

    #[test]
    fn parses_g2_csv() {
        let csv = "Review Text,Star Rating,Review Date,Product Name\n\
                   Setup was painful,2,2024-03-10,BambooHR\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(reviews[0].review_text, "Setup was painful");
        assert_eq!(reviews[0].rating, 2.0);
        assert_eq!(reviews[0].product_name, "BambooHR");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let csv = "REVIEW_TEXT,Rating\nWorks well,4\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(reviews[0].review_text, "Works well");
        assert_eq!(reviews[0].rating, 4.0);
    }

    #[test]
    fn clamps_out_of_range_ratings() {
        let csv = "review_text,rating\nToo high,11\nToo low,0\nNegative,-3\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(reviews[0].rating, 5.0);
        assert_eq!(reviews[1].rating, 1.0);
        assert_eq!(reviews[2].rating, 1.0);
    }

    #[test]
    fn unparseable_rating_defaults_to_three() {
        let csv = "review_text,rating\nNo rating given,great\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(reviews[0].rating, 3.0);
    }

    #[test]
    fn rating_with_suffix_parses_numeric_prefix() {
        assert_eq!(parse_rating("4 stars"), 4.0);
        assert_eq!(parse_rating("4.5/5"), 4.5);
    }

    #[test]
    fn blank_date_defaults_to_today() {
        let csv = "review_text,rating,review_date\nFine,3,\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(
            reviews[0].review_date,
            Utc::now().format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn drops_rows_without_review_text() {
        let csv = "review_text,rating\nKeep me,4\n,5\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_text, "Keep me");
    }

    #[test]
    fn empty_file_is_an_error() {
        let err = parse_reviews("review_text,rating\n").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn no_review_text_rows_is_an_error() {
        let csv = "other_column,rating\nvalue,4\n";
        let err = parse_reviews(csv).unwrap_err();
        assert!(err.to_string().contains("review text"));
    }

    #[test]
    fn strips_utf8_bom() {
        let csv = "\u{feff}review_text,rating\nWith BOM,4\n";
        let reviews = parse_reviews(csv).unwrap();
        assert_eq!(reviews[0].review_text, "With BOM");
    }
}
