use std::sync::Arc;

use sqlx::SqlitePool;

use crate::analysis::analyzer::JobRoleAnalyzer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// The analyzer owns the LLM client and similarity index; shared across requests.
    pub analyzer: Arc<JobRoleAnalyzer>,
}
