//! Gemini API client
//!
//! Thin, non-streaming client around the `generateContent` REST endpoint.
//! One request per analysis; no retry, backoff, or chunking. Responses are
//! requested in JSON mode with a fixed generation temperature.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use rvi_common::config::GeminiConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

const GENERATION_TEMPERATURE: f64 = 0.3;
const SNIPPET_MAX_CHARS: usize = 300;

/// Gemini client errors
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Key absent, too short, or the template placeholder
    #[error("Missing Gemini API key. Please set GEMINI_API_KEY in the environment.")]
    MissingApiKey,

    /// Network / transport failure, including the request timeout
    #[error("Gemini request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream quota exhausted (HTTP 429)
    #[error("Gemini rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,

    /// Any other non-success status from the API
    #[error("Gemini returned {status}: {snippet}")]
    UpstreamStatus { status: StatusCode, snippet: String },

    /// 2xx response with no usable candidate text
    #[error("Gemini returned an empty response.")]
    EmptyResponse,
}

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl GeminiClient {
    /// Build a client from configuration.
    ///
    /// Validates the API key up front so a missing key is rejected before
    /// any network call is attempted.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        config
            .validate_key()
            .map_err(|_| GeminiError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            config.endpoint.trim_end_matches('/'),
            config.model,
            config.api_key
        );

        Ok(Self {
            client,
            url,
            model: config.model.clone(),
        })
    }

    /// Send one prompt and return the model's response text.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let started = Instant::now();
        let body = GenerateContentRequest::new(prompt);

        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "POST Gemini generateContent"
        );

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(model = %self.model, "Gemini rate limit hit");
            return Err(GeminiError::RateLimited);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %status,
                %snippet,
                model = %self.model,
                latency_ms = started.elapsed().as_millis() as u64,
                "Gemini generateContent returned non-success status"
            );
            return Err(GeminiError::UpstreamStatus { status, snippet });
        }

        let out: GenerateContentResponse = response.json().await?;

        let text = out
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .find(|t| !t.trim().is_empty())
            .ok_or(GeminiError::EmptyResponse)?;

        info!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis() as u64,
            response_chars = text.len(),
            "Gemini response received"
        );

        Ok(text)
    }
}

/// Truncate an upstream error body for logs and error messages
fn make_snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_MAX_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("{cut}...")
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: GENERATION_TEMPERATURE,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
