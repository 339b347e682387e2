use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub llm: LlmEndpointConfig,
    pub analyzer: AnalyzerConfig,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model: String,
}

/// Where completions are requested from.
#[derive(Debug, Clone)]
pub struct LlmEndpointConfig {
    pub base_url: String,
    pub completion_path: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

/// Knobs for the analysis pipeline itself.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub similarity_threshold: f32,
    pub similarity_backend: String,
    pub min_competencies: usize,
    pub max_competencies: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Hashing,
    Http,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            similarity_backend: "flat".to_string(),
            min_competencies: 3,
            max_competencies: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = AnalyzerConfig::default();
        let analyzer = AnalyzerConfig {
            similarity_threshold: parse_env(
                "JOB_ROLE_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            )?,
            similarity_backend: std::env::var("SIMILARITY_BACKEND")
                .unwrap_or(defaults.similarity_backend),
            min_competencies: parse_env("MIN_COMPETENCIES", defaults.min_competencies)?,
            max_competencies: parse_env("MAX_COMPETENCIES", defaults.max_competencies)?,
        };
        if analyzer.min_competencies > analyzer.max_competencies {
            anyhow::bail!(
                "MIN_COMPETENCIES ({}) must not exceed MAX_COMPETENCIES ({})",
                analyzer.min_competencies,
                analyzer.max_competencies
            );
        }

        let embedding_backend = match std::env::var("EMBEDDING_BACKEND")
            .unwrap_or_else(|_| "hashing".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "hashing" => EmbeddingBackend::Hashing,
            "http" => EmbeddingBackend::Http,
            other => anyhow::bail!("EMBEDDING_BACKEND must be 'hashing' or 'http', got '{other}'"),
        };

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://job_roles.db".to_string()),
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm: LlmEndpointConfig {
                base_url: require_env("LLM_BASE_URL")?,
                completion_path: std::env::var("LLM_COMPLETION_PATH")
                    .unwrap_or_else(|_| "/api/v1/completions".to_string()),
                api_key: optional_env("LLM_API_KEY"),
                model: optional_env("LLM_MODEL"),
                timeout_secs: parse_env("LLM_TIMEOUT_SECS", 30)?,
            },
            analyzer,
            embedding_backend,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "BAAI/bge-small-en".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_defaults() {
        let config = AnalyzerConfig::default();
        assert!((config.similarity_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(config.similarity_backend, "flat");
        assert_eq!(config.min_competencies, 3);
        assert_eq!(config.max_competencies, 5);
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: usize = parse_env("ROLE_ANALYZER_TEST_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("ROLE_ANALYZER_TEST_GARBAGE", "not-a-number");
        let result: Result<u16> = parse_env("ROLE_ANALYZER_TEST_GARBAGE", 1);
        assert!(result.is_err());
    }
}
