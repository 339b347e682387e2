use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::AnalysisError;

pub const DEFAULT_COMPETENCY_TYPE: &str = "technical";
pub const MIN_LEVEL: i64 = 1;
pub const MAX_LEVEL: i64 = 5;

/// A normalized job role as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRoleSummary {
    pub job_role_id: Uuid,
    pub job_title: String,
    pub normalized_summary: String,
    pub years_experience: i64,
}

impl JobRoleSummary {
    /// Builds a fresh role with a random id. Years must be non-negative.
    pub fn new(
        job_title: impl Into<String>,
        normalized_summary: impl Into<String>,
        years_experience: i64,
    ) -> Result<Self, AnalysisError> {
        if years_experience < 0 {
            return Err(AnalysisError::Invalid(
                "years_experience must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            job_role_id: Uuid::new_v4(),
            job_title: job_title.into(),
            normalized_summary: normalized_summary.into(),
            years_experience,
        })
    }
}

/// A validated competency: level is always within 1..=5 and type is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competency {
    pub name: String,
    pub level: u8,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Competency {
    pub fn new(name: impl Into<String>, level: i64, kind: Option<&str>) -> Result<Self, AnalysisError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(AnalysisError::Invalid("level must be between 1 and 5".to_string()));
        }
        Ok(Self {
            name: name.into(),
            level: level as u8,
            kind: kind
                .filter(|k| !k.is_empty())
                .unwrap_or(DEFAULT_COMPETENCY_TYPE)
                .to_string(),
        })
    }

    /// Validates one entry of an LLM-produced competency array.
    ///
    /// `level` may arrive as an integer, an integral float, or a numeric string.
    pub fn from_value(value: &Value) -> Result<Self, AnalysisError> {
        let obj = value
            .as_object()
            .ok_or_else(|| AnalysisError::Invalid("competency entries must be objects".to_string()))?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AnalysisError::Invalid("competency name must be a string".to_string()))?;

        let level = obj
            .get("level")
            .and_then(coerce_level)
            .ok_or_else(|| {
                AnalysisError::Invalid("level must be an integer between 1 and 5".to_string())
            })?;

        let kind = obj.get("type").and_then(Value::as_str);
        Self::new(name, level, kind)
    }
}

fn coerce_level(value: &Value) -> Option<i64> {
    match value {
        // Fractional levels truncate toward zero.
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRoleWithCompetencies {
    pub job_role: JobRoleSummary,
    pub competencies: Vec<Competency>,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types for POST /api/analyze
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub job_title: String,
    pub job_description: String,
    pub years_of_experience: i64,
}

/// The analysis result as it travels over the wire.
///
/// Decoding is lenient on the competency entries so a client can render
/// whatever the server sent; the renderer decides how to display odd values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub job_role_id: String,
    pub normalized_job_role_summary: String,
    pub competencies: Vec<CompetencyRecord>,
}

/// One competency as received. Missing or mistyped fields decode to empty
/// values (level 0) instead of failing the whole result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyRecord {
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_level")]
    pub level: i64,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_kind(deserializer)?.unwrap_or_default())
}

fn lenient_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_level(&value).unwrap_or(0))
}

fn lenient_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

impl From<&JobRoleWithCompetencies> for AnalysisResult {
    fn from(result: &JobRoleWithCompetencies) -> Self {
        Self {
            job_role_id: result.job_role.job_role_id.to_string(),
            normalized_job_role_summary: result.job_role.normalized_summary.clone(),
            competencies: result
                .competencies
                .iter()
                .map(|c| CompetencyRecord {
                    name: c.name.clone(),
                    level: i64::from(c.level),
                    kind: Some(c.kind.clone()),
                })
                .collect(),
        }
    }
}
