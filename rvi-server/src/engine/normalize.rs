//! Response normalization
//!
//! The model's JSON is taken at face value only after enum whitelisting,
//! numeric clamping, and placeholder substitution. Index cross-references
//! (insight -> review, action item -> insight) are passed through as
//! returned; range checks happen at persistence time.

use serde::Deserialize;

pub const VALID_CATEGORIES: [&str; 4] = [
    "feature_gap",
    "churn_driver",
    "product_strength",
    "pricing_concern",
];
pub const VALID_IMPACTS: [&str; 3] = ["high", "medium", "low"];
pub const VALID_PRIORITIES: [&str; 3] = ["high", "medium", "low"];

pub const DEFAULT_CATEGORY: &str = "feature_gap";
pub const DEFAULT_IMPACT: &str = "medium";
pub const DEFAULT_PRIORITY: &str = "medium";

/// Raw response shape as the model returns it. Every field is optional;
/// missing sections collapse to empty arrays.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawAnalysis {
    pub competitors: Vec<RawCompetitor>,
    pub insights: Vec<RawInsight>,
    #[serde(rename = "actionItems", alias = "actions")]
    pub action_items: Vec<RawActionItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCompetitor {
    pub name: Option<String>,
    pub mention_count: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub praise_themes: Vec<String>,
    pub complaint_themes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInsight {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub impact: Option<String>,
    pub confidence_score: Option<f64>,
    pub source_review_indices: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawActionItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub related_insight_index: Option<i64>,
}

/// Normalized analysis, safe to persist
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub competitors: Vec<CompetitorRecord>,
    pub insights: Vec<InsightRecord>,
    pub action_items: Vec<ActionItemRecord>,
}

#[derive(Debug, Clone)]
pub struct CompetitorRecord {
    pub name: String,
    pub mention_count: i64,
    pub avg_sentiment: f64,
    pub praise_themes: Vec<String>,
    pub complaint_themes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InsightRecord {
    pub title: String,
    pub description: String,
    pub category: String,
    pub impact: String,
    pub confidence_score: f64,
    pub source_review_indices: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct ActionItemRecord {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub related_insight_index: Option<i64>,
}

/// Parse the model's response text and normalize it
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, serde_json::Error> {
    let raw: RawAnalysis = serde_json::from_str(text)?;
    Ok(normalize_analysis(raw))
}

/// Apply whitelists, clamps, and placeholder defaults
pub fn normalize_analysis(raw: RawAnalysis) -> AnalysisResult {
    let competitors = raw
        .competitors
        .into_iter()
        .map(|c| CompetitorRecord {
            name: non_empty(c.name, "Unknown"),
            mention_count: (c.mention_count.unwrap_or(1.0).round() as i64).max(1),
            avg_sentiment: c.avg_sentiment.unwrap_or(0.0).clamp(-1.0, 1.0),
            praise_themes: c.praise_themes,
            complaint_themes: c.complaint_themes,
        })
        .collect();

    let insights = raw
        .insights
        .into_iter()
        .map(|i| InsightRecord {
            title: non_empty(i.title, "Untitled Insight"),
            description: i.description.unwrap_or_default(),
            category: whitelist(i.category, &VALID_CATEGORIES, DEFAULT_CATEGORY),
            impact: whitelist(i.impact, &VALID_IMPACTS, DEFAULT_IMPACT),
            confidence_score: i.confidence_score.unwrap_or(0.5).clamp(0.0, 1.0),
            source_review_indices: i.source_review_indices,
        })
        .collect();

    let action_items = raw
        .action_items
        .into_iter()
        .map(|a| ActionItemRecord {
            title: non_empty(a.title, "Action Item"),
            description: a.description.unwrap_or_default(),
            priority: whitelist(a.priority, &VALID_PRIORITIES, DEFAULT_PRIORITY),
            related_insight_index: a.related_insight_index,
        })
        .collect();

    AnalysisResult {
        competitors,
        insights,
        action_items,
    }
}

/// Map a confidence score onto the claim confidence scale
pub fn claim_confidence(score: f64) -> &'static str {
    if score > 0.7 {
        "high"
    } else if score > 0.4 {
        "medium"
    } else {
        "low"
    }
}

fn whitelist(value: Option<String>, allowed: &[&str], default: &str) -> String {
    match value {
        Some(v) if allowed.contains(&v.as_str()) => v,
        _ => default.to_string(),
    }
}

fn non_empty(value: Option<String>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => placeholder.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_falls_back_to_default() {
        let result = parse_analysis(
            r#"{"insights": [{"title": "T", "category": "made_up", "impact": "high"}]}"#,
        )
        .unwrap();
        assert_eq!(result.insights[0].category, "feature_gap");
        assert_eq!(result.insights[0].impact, "high");
    }

    #[test]
    fn unknown_impact_and_priority_fall_back_to_medium() {
        let result = parse_analysis(
            r#"{
                "insights": [{"title": "T", "impact": "catastrophic"}],
                "actionItems": [{"title": "Do it", "priority": "urgent"}]
            }"#,
        )
        .unwrap();
        assert_eq!(result.insights[0].impact, "medium");
        assert_eq!(result.action_items[0].priority, "medium");
    }

    #[test]
    fn confidence_is_clamped_into_unit_interval() {
        let result = parse_analysis(
            r#"{"insights": [
                {"title": "A", "confidenceScore": 1.7},
                {"title": "B", "confidenceScore": -0.2}
            ]}"#,
        )
        .unwrap();
        assert_eq!(result.insights[0].confidence_score, 1.0);
        assert_eq!(result.insights[1].confidence_score, 0.0);
    }

    #[test]
    fn sentiment_is_clamped() {
        let result =
            parse_analysis(r#"{"competitors": [{"name": "Workday", "avgSentiment": -3.5}]}"#)
                .unwrap();
        assert_eq!(result.competitors[0].avg_sentiment, -1.0);
    }

    #[test]
    fn missing_fields_get_placeholders() {
        let result = parse_analysis(
            r#"{
                "competitors": [{}],
                "insights": [{}],
                "actionItems": [{}]
            }"#,
        )
        .unwrap();
        let comp = &result.competitors[0];
        assert_eq!(comp.name, "Unknown");
        assert_eq!(comp.mention_count, 1);
        assert_eq!(comp.avg_sentiment, 0.0);
        assert!(comp.praise_themes.is_empty());

        let insight = &result.insights[0];
        assert_eq!(insight.title, "Untitled Insight");
        assert_eq!(insight.description, "");
        assert_eq!(insight.confidence_score, 0.5);

        let item = &result.action_items[0];
        assert_eq!(item.title, "Action Item");
        assert_eq!(item.related_insight_index, None);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let result = parse_analysis("{}").unwrap();
        assert!(result.competitors.is_empty());
        assert!(result.insights.is_empty());
        assert!(result.action_items.is_empty());
    }

    #[test]
    fn actions_alias_is_accepted() {
        let result = parse_analysis(r#"{"actions": [{"title": "Fix onboarding"}]}"#).unwrap();
        assert_eq!(result.action_items.len(), 1);
        assert_eq!(result.action_items[0].title, "Fix onboarding");
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_analysis("not json at all").is_err());
    }

    #[test]
    fn claim_confidence_thresholds() {
        assert_eq!(claim_confidence(0.9), "high");
        assert_eq!(claim_confidence(0.71), "high");
        assert_eq!(claim_confidence(0.7), "medium");
        assert_eq!(claim_confidence(0.41), "medium");
        assert_eq!(claim_confidence(0.4), "low");
        assert_eq!(claim_confidence(0.0), "low");
    }
}
