//! Job role analyzer. Coordinates normalization, competency extraction, and persistence.
//!
//! Pipeline for a new description:
//! 1. Reuse a stored role when the description embedding is close enough
//! 2. LLM: normalize the description into a summary
//! 3. LLM: extract competencies as a JSON array, validate, enforce min/max
//! 4. Persist role + competencies + embedding and extend the similarity index

use std::sync::Arc;

use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;

use super::models::{Competency, JobRoleSummary, JobRoleWithCompetencies};
use super::prompts::{
    render, EXTRACT_COMPETENCIES_PROMPT_TEMPLATE, NORMALIZE_JD_PROMPT_TEMPLATE,
};
use super::similarity::SimilarityChecker;
use super::{store, AnalysisError};
use crate::config::AnalyzerConfig;
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, PLAIN_TEXT_INSTRUCTION};
use crate::llm_client::{parse_json_text, CompletionClient, LlmError};

pub struct JobRoleAnalyzer {
    pool: SqlitePool,
    llm: Arc<dyn CompletionClient>,
    similarity: SimilarityChecker,
    config: AnalyzerConfig,
}

impl JobRoleAnalyzer {
    pub fn new(
        pool: SqlitePool,
        llm: Arc<dyn CompletionClient>,
        similarity: SimilarityChecker,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            pool,
            llm,
            similarity,
            config,
        }
    }

    pub async fn analyze(
        &self,
        job_title: &str,
        job_description: &str,
        years_of_experience: i64,
    ) -> Result<JobRoleWithCompetencies, AnalysisError> {
        if job_description.trim().is_empty() {
            return Err(AnalysisError::Invalid(
                "job_description cannot be empty".to_string(),
            ));
        }
        if years_of_experience < 0 {
            return Err(AnalysisError::Invalid(
                "years_of_experience must be non-negative".to_string(),
            ));
        }

        if let Some((similar, score)) = self.similarity.find_similar_role(job_description).await? {
            if let Some(existing) =
                store::get_job_role_with_competencies(&self.pool, similar.job_role_id).await?
            {
                info!(
                    "Reusing job role {} (similarity {score:.3})",
                    similar.job_role_id
                );
                return Ok(existing);
            }
        }

        let years = years_of_experience.to_string();

        let normalize_prompt = render(
            NORMALIZE_JD_PROMPT_TEMPLATE,
            &[
                ("job_title", job_title),
                ("job_description", job_description),
                ("years_of_experience", years.as_str()),
                ("format_instruction", PLAIN_TEXT_INSTRUCTION),
            ],
        );
        let summary = self.llm.complete(&normalize_prompt).await?.trim().to_string();

        let job_role = JobRoleSummary::new(job_title, summary.as_str(), years_of_experience)?;

        let max = self.config.max_competencies.to_string();
        let extract_prompt = render(
            EXTRACT_COMPETENCIES_PROMPT_TEMPLATE,
            &[
                ("job_title", job_title),
                ("normalized_summary", summary.as_str()),
                ("years_of_experience", years.as_str()),
                ("job_description", job_description),
                ("max_competencies", max.as_str()),
                ("format_instruction", JSON_ONLY_INSTRUCTION),
            ],
        );
        let raw = self.llm.complete(&extract_prompt).await?;
        let competencies = self.parse_competencies(&raw)?;

        let embedding = self.similarity.compute_embedding(job_description).await?;
        let stored_embedding = (!embedding.is_empty()).then_some(embedding.as_slice());
        store::add_job_role(&self.pool, &job_role, &competencies, stored_embedding).await?;
        self.similarity.add_to_index(&job_role, &embedding).await?;

        info!(
            "Analyzed new job role {} '{}' with {} competencies",
            job_role.job_role_id,
            job_role.job_title,
            competencies.len()
        );

        Ok(JobRoleWithCompetencies {
            job_role,
            competencies,
        })
    }

    fn parse_competencies(&self, raw: &str) -> Result<Vec<Competency>, AnalysisError> {
        let payload: Value = parse_json_text(raw).map_err(|e| match e {
            LlmError::Parse(_) => AnalysisError::Invalid(
                "LLM response for competencies must be valid JSON.".to_string(),
            ),
            other => AnalysisError::Llm(other),
        })?;

        let entries = payload.as_array().ok_or_else(|| {
            AnalysisError::Invalid("Competency payload must be a sequence of objects.".to_string())
        })?;

        let mut competencies = entries
            .iter()
            .map(Competency::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        if competencies.len() < self.config.min_competencies {
            return Err(AnalysisError::Invalid(format!(
                "At least {} competencies are required; received {}.",
                self.config.min_competencies,
                competencies.len()
            )));
        }
        competencies.truncate(self.config.max_competencies);
        Ok(competencies)
    }
}
