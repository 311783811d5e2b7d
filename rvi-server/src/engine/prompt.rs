//! Single mega-prompt construction
//!
//! Every stored review is serialized into one JSON array embedded in a
//! fixed instruction template. The whole dataset goes out as one prompt
//! body; there is no chunking.

use rvi_common::db::models::Review;
use rvi_common::{Error, Result};
use serde::Serialize;

/// One review as presented to the model. `index` is how the response
/// refers back to source reviews.
#[derive(Debug, Serialize)]
pub struct ReviewInput {
    pub index: usize,
    pub text: String,
    pub rating: f64,
    pub platform: String,
    pub product: String,
    pub date: String,
    pub reviewer: String,
    pub role: String,
}

/// Build prompt inputs from stored reviews, preserving their order
pub fn review_inputs(reviews: &[Review]) -> Vec<ReviewInput> {
    reviews
        .iter()
        .enumerate()
        .map(|(index, r)| ReviewInput {
            index,
            text: r.review_text.clone(),
            rating: r.rating,
            platform: r.platform.clone(),
            product: r.product_name.clone(),
            date: r.review_date.clone(),
            reviewer: r.reviewer_name.clone(),
            role: r.reviewer_role.clone(),
        })
        .collect()
}

/// Render the full instruction template with the review data embedded
pub fn build_mega_prompt(reviews: &[ReviewInput]) -> Result<String> {
    let reviews_json = serde_json::to_string_pretty(reviews)
        .map_err(|e| Error::Internal(format!("Failed to serialize reviews: {e}")))?;

    Ok(format!(
        r#"You are a competitive intelligence analyst for HR Tech SaaS companies.

Analyze ALL of the following customer reviews and produce a COMPLETE analysis in a single JSON response.

## REVIEWS DATA:
{reviews_json}

## INSTRUCTIONS:
Analyze every review above and produce the following:

### 1. COMPETITORS
Identify each unique product/company mentioned. For each competitor:
- Count how many reviews mention them
- Calculate average sentiment (-1.0 = very negative, 0 = neutral, +1.0 = very positive)
- List 2-4 praise themes (what users love)
- List 2-4 complaint themes (what users dislike)

### 2. INSIGHTS
Generate 5-10 actionable insights from patterns across reviews. Each insight must:
- Have a clear, specific title
- Have a detailed 1-2 sentence description
- Be categorized as: "feature_gap", "churn_driver", "product_strength", or "pricing_concern"
- Have impact rated as: "high", "medium", or "low"
- Have a confidenceScore (0.0 to 1.0) based on how many reviews support it
- Reference which reviews support it using their "index" values from the input

### 3. ACTION ITEMS
Generate 4-8 concrete action items based on the insights. Each must:
- Have a specific, actionable title (start with a verb)
- Have a detailed description of what to do
- Be prioritized as: "high", "medium", or "low"
- Reference which insight it relates to (by index in the insights array)

## REQUIRED JSON FORMAT:
{{
  "competitors": [
    {{
      "name": "Product Name",
      "mentionCount": 5,
      "avgSentiment": 0.3,
      "praiseThemes": ["Easy to use", "Good reporting"],
      "complaintThemes": ["Slow support", "High pricing"]
    }}
  ],
  "insights": [
    {{
      "title": "Onboarding Complexity Drives Churn",
      "description": "Multiple reviews across Workday and BambooHR mention...",
      "category": "churn_driver",
      "impact": "high",
      "confidenceScore": 0.8,
      "sourceReviewIndices": [0, 3, 7, 12]
    }}
  ],
  "actionItems": [
    {{
      "title": "Build guided onboarding wizard",
      "description": "Create a step-by-step onboarding flow...",
      "priority": "high",
      "relatedInsightIndex": 0
    }}
  ]
}}

Return ONLY valid JSON. No markdown, no explanation, just the JSON object."#
    ))
}
