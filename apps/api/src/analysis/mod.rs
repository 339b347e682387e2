// Job role analysis: normalize a job description, extract competencies,
// and reuse previously analyzed roles when a new description is close enough.
// All LLM calls go through llm_client.

pub mod analyzer;
pub mod embeddings;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod similarity;
pub mod store;

use thiserror::Error;

use crate::llm_client::LlmError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input or model output failed validation; safe to show to the caller.
    #[error("{0}")]
    Invalid(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored data could not be decoded: {0}")]
    Corrupt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Similarity index error: {0}")]
    Index(String),
}
