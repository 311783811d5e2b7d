//! Evidence engine pipeline
//!
//! Processes uploaded CSV reviews into source-traced insights:
//! 1. columns - extract reviews from CSV (local, no API)
//! 2. prompt + gemini - one Gemini call for competitors, insights, action items
//! 3. normalize - whitelist/clamp the model's JSON
//! 4. pipeline - orchestration and persistence

pub mod columns;
pub mod gemini;
pub mod normalize;
pub mod pipeline;
pub mod prompt;

pub use gemini::{GeminiClient, GeminiError};
pub use pipeline::{run_full_pipeline, PipelineError, PipelineSummary};
