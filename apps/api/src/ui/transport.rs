//! Ways of getting a form payload analyzed: over HTTP, or in-process.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use super::form::FormPayload;
use super::{SubmitError, GENERIC_ERROR_MESSAGE};
use crate::analysis::analyzer::JobRoleAnalyzer;
use crate::analysis::models::{AnalysisResult, AnalyzeRequest};
use crate::analysis::AnalysisError;

pub const ANALYZE_PATH: &str = "/api/analyze";

#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn analyze(&self, payload: &FormPayload) -> Result<AnalysisResult, SubmitError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

/// POSTs the payload as JSON to `{base_url}/api/analyze`.
///
/// There is no timeout and no retry: a hung request stays pending until the
/// connection resolves, and every failure is reported once.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), ANALYZE_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn analyze(&self, payload: &FormPayload) -> Result<AnalysisResult, SubmitError> {
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // A non-JSON or detail-less body falls back to the generic message.
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .and_then(|d| d.as_str().map(str::to_string))
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<AnalysisResult>()
            .await
            .map_err(|e| SubmitError::Decode(e.to_string()))
    }
}

/// Runs the analyzer in-process; used by the server's no-script form route.
#[derive(Clone)]
pub struct LocalTransport {
    analyzer: Arc<JobRoleAnalyzer>,
}

impl LocalTransport {
    pub fn new(analyzer: Arc<JobRoleAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl AnalysisTransport for LocalTransport {
    async fn analyze(&self, payload: &FormPayload) -> Result<AnalysisResult, SubmitError> {
        let request: AnalyzeRequest =
            serde_json::from_value(payload.as_value()).map_err(|e| SubmitError::Rejected {
                status: 400,
                detail: e.to_string(),
            })?;

        let result = self
            .analyzer
            .analyze(
                &request.job_title,
                &request.job_description,
                request.years_of_experience,
            )
            .await
            .map_err(|e| match e {
                AnalysisError::Invalid(detail) => SubmitError::Rejected {
                    status: 400,
                    detail,
                },
                other => {
                    error!("Analysis failed: {other}");
                    SubmitError::Rejected {
                        status: 500,
                        detail: GENERIC_ERROR_MESSAGE.to_string(),
                    }
                }
            })?;

        Ok(AnalysisResult::from(&result))
    }
}
