//! Role similarity: an exhaustive inner-product index over L2-normalised
//! description embeddings, used to reuse earlier analyses of near-identical roles.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::embeddings::EmbeddingProvider;
use super::models::JobRoleSummary;
use super::{store, AnalysisError};

/// Backend names accepted for the exhaustive index. `faiss` is kept as an alias
/// for configurations that name the flat inner-product index that way.
const SUPPORTED_BACKENDS: [&str; 2] = ["flat", "faiss"];

fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vec![0.0; vector.len()];
    }
    vector.iter().map(|v| v / norm).collect()
}

fn dot(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).map(|(a, b)| a * b).sum()
}

/// Flat cosine index. The dimension is fixed by construction.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl SimilarityIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<(), AnalysisError> {
        if vector.len() != self.dimension {
            return Err(AnalysisError::Index(format!(
                "vector has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        self.vectors.push(normalize(vector));
        Ok(())
    }

    /// Returns the position and cosine score of the closest stored vector.
    pub fn best_match(&self, query: &[f32]) -> Result<Option<(usize, f32)>, AnalysisError> {
        if query.len() != self.dimension {
            return Err(AnalysisError::Index(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                self.dimension
            )));
        }
        let query = normalize(query);
        Ok(self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, candidate)| (i, dot(&query, candidate)))
            .fold(None, |best: Option<(usize, f32)>, (i, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((i, score)),
            }))
    }
}

#[derive(Default)]
struct IndexState {
    loaded: bool,
    index: Option<SimilarityIndex>,
    roles: Vec<JobRoleSummary>,
}

impl IndexState {
    fn insert(&mut self, role: JobRoleSummary, vector: &[f32]) -> Result<(), AnalysisError> {
        let index = self
            .index
            .get_or_insert_with(|| SimilarityIndex::new(vector.len()));
        index.add(vector)?;
        self.roles.push(role);
        Ok(())
    }
}

/// Finds previously analyzed roles whose description embedding is close to a new one.
pub struct SimilarityChecker {
    pool: SqlitePool,
    provider: Arc<dyn EmbeddingProvider>,
    threshold: f32,
    state: Mutex<IndexState>,
}

impl SimilarityChecker {
    pub fn new(
        pool: SqlitePool,
        provider: Arc<dyn EmbeddingProvider>,
        threshold: f32,
        backend: &str,
    ) -> Result<Self, AnalysisError> {
        if !SUPPORTED_BACKENDS.contains(&backend.to_ascii_lowercase().as_str()) {
            return Err(AnalysisError::Invalid(format!(
                "similarity backend '{backend}' is not supported; use 'flat'"
            )));
        }
        Ok(Self {
            pool,
            provider,
            threshold,
            state: Mutex::new(IndexState::default()),
        })
    }

    async fn ensure_loaded(&self, state: &mut IndexState) -> Result<(), AnalysisError> {
        if state.loaded {
            return Ok(());
        }
        // Built aside and swapped in whole, so a failed load leaves nothing behind.
        let mut fresh = IndexState::default();
        for (role, embedding) in store::job_role_embeddings(&self.pool).await? {
            if embedding.is_empty() {
                continue;
            }
            if let Some(index) = &fresh.index {
                if index.dimension() != embedding.len() {
                    warn!(
                        "Skipping stored role {}: embedding has {} dimensions, index has {}",
                        role.job_role_id,
                        embedding.len(),
                        index.dimension()
                    );
                    continue;
                }
            }
            fresh.insert(role, &embedding)?;
        }
        fresh.loaded = true;
        info!(
            "Similarity index loaded with {} roles",
            fresh.index.as_ref().map_or(0, SimilarityIndex::len)
        );
        *state = fresh;
        Ok(())
    }

    pub async fn compute_embedding(&self, text: &str) -> Result<Vec<f32>, AnalysisError> {
        self.provider.embed(text).await
    }

    /// Returns the closest stored role when its score reaches the threshold.
    pub async fn find_similar_role(
        &self,
        job_description: &str,
    ) -> Result<Option<(JobRoleSummary, f32)>, AnalysisError> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let Some(index) = state.index.as_ref().filter(|index| !index.is_empty()) else {
            return Ok(None);
        };

        let query = self.compute_embedding(job_description).await?;
        if query.is_empty() {
            return Ok(None);
        }
        if query.len() != index.dimension() {
            return Err(AnalysisError::Embedding(
                "embedding provider returned a vector with unexpected dimensionality".to_string(),
            ));
        }

        let Some((position, score)) = index.best_match(&query)? else {
            return Ok(None);
        };
        debug!("Closest stored role scored {score:.3}");
        if score < self.threshold {
            return Ok(None);
        }
        Ok(Some((state.roles[position].clone(), score)))
    }

    pub async fn add_to_index(
        &self,
        job_role: &JobRoleSummary,
        embedding: &[f32],
    ) -> Result<(), AnalysisError> {
        if embedding.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        state.insert(job_role.clone(), embedding)
    }
}
