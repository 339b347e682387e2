//! Axum route handlers for the Analysis API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::analysis::models::{AnalysisResult, AnalyzeRequest};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/analyze
///
/// Normalizes the job description and returns the role id, summary, and competencies.
/// Malformed bodies are reported as 400 with a `detail` message rather than axum's plain-text rejection.
pub async fn handle_analyze(
    State(state): State<AppState>,
    request: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let Json(request) = request.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    if request.job_title.trim().is_empty() {
        return Err(AppError::Validation("job_title cannot be empty".to_string()));
    }

    let result = state
        .analyzer
        .analyze(
            &request.job_title,
            &request.job_description,
            request.years_of_experience,
        )
        .await?;

    Ok(Json(AnalysisResult::from(&result)))
}
