//! SQLite persistence for analyzed roles, their competencies, and embeddings.

use sqlx::{FromRow, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::models::{Competency, JobRoleSummary, JobRoleWithCompetencies};
use super::AnalysisError;

const SCHEMA_STATEMENTS: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS job_roles (
        job_role_id TEXT PRIMARY KEY,
        job_title TEXT NOT NULL,
        normalized_summary TEXT NOT NULL,
        years_experience INTEGER NOT NULL,
        embedding_vector TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS competencies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        job_role_id TEXT NOT NULL,
        name TEXT NOT NULL,
        level INTEGER NOT NULL,
        type TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (job_role_id) REFERENCES job_roles(job_role_id)
    )
    "#,
];

#[derive(Debug, FromRow)]
struct JobRoleRow {
    job_role_id: String,
    job_title: String,
    normalized_summary: String,
    years_experience: i64,
    embedding_vector: Option<String>,
}

#[derive(Debug, FromRow)]
struct CompetencyRow {
    name: String,
    level: i64,
    #[sqlx(rename = "type")]
    kind: Option<String>,
}

impl JobRoleRow {
    fn summary(&self) -> Result<JobRoleSummary, AnalysisError> {
        let job_role_id = Uuid::parse_str(&self.job_role_id).map_err(|e| {
            AnalysisError::Corrupt(format!("job_role_id '{}': {e}", self.job_role_id))
        })?;
        Ok(JobRoleSummary {
            job_role_id,
            job_title: self.job_title.clone(),
            normalized_summary: self.normalized_summary.clone(),
            years_experience: self.years_experience,
        })
    }
}

/// Creates the tables if they do not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), AnalysisError> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Job role schema ready");
    Ok(())
}

/// Stores a role, replacing any previous row with the same id and all of its competencies.
pub async fn add_job_role(
    pool: &SqlitePool,
    job_role: &JobRoleSummary,
    competencies: &[Competency],
    embedding: Option<&[f32]>,
) -> Result<(), AnalysisError> {
    let role_id = job_role.job_role_id.to_string();
    let embedding_json = embedding.map(serde_json::to_string).transpose()?;

    let mut tx = pool.begin().await?;

    // Children go first: the REPLACE below deletes the parent row.
    sqlx::query("DELETE FROM competencies WHERE job_role_id = ?")
        .bind(&role_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO job_roles
            (job_role_id, job_title, normalized_summary, years_experience, embedding_vector)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&role_id)
    .bind(&job_role.job_title)
    .bind(&job_role.normalized_summary)
    .bind(job_role.years_experience)
    .bind(embedding_json)
    .execute(&mut *tx)
    .await?;

    for competency in competencies {
        sqlx::query("INSERT INTO competencies (job_role_id, name, level, type) VALUES (?, ?, ?, ?)")
            .bind(&role_id)
            .bind(&competency.name)
            .bind(i64::from(competency.level))
            .bind(&competency.kind)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(
        "Stored job role {role_id} with {} competencies",
        competencies.len()
    );
    Ok(())
}

/// Returns every stored role along with its embedding (empty when none was stored).
pub async fn job_role_embeddings(
    pool: &SqlitePool,
) -> Result<Vec<(JobRoleSummary, Vec<f32>)>, AnalysisError> {
    let rows = sqlx::query_as::<_, JobRoleRow>(
        "SELECT job_role_id, job_title, normalized_summary, years_experience, embedding_vector FROM job_roles ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<_, AnalysisError> {
            let embedding: Vec<f32> = match row.embedding_vector.as_deref() {
                Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
                _ => Vec::new(),
            };
            Ok((row.summary()?, embedding))
        })
        .collect()
}

/// Loads a role and its competencies in insertion order.
pub async fn get_job_role_with_competencies(
    pool: &SqlitePool,
    job_role_id: Uuid,
) -> Result<Option<JobRoleWithCompetencies>, AnalysisError> {
    let role_id = job_role_id.to_string();

    let row = sqlx::query_as::<_, JobRoleRow>(
        "SELECT job_role_id, job_title, normalized_summary, years_experience, embedding_vector FROM job_roles WHERE job_role_id = ?",
    )
    .bind(&role_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let competency_rows = sqlx::query_as::<_, CompetencyRow>(
        "SELECT name, level, type FROM competencies WHERE job_role_id = ? ORDER BY id",
    )
    .bind(&role_id)
    .fetch_all(pool)
    .await?;

    let competencies = competency_rows
        .into_iter()
        .map(|c| Competency::new(c.name, c.level, c.kind.as_deref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(JobRoleWithCompetencies {
        job_role: row.summary()?,
        competencies,
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    pub(crate) fn sample_competencies() -> Vec<Competency> {
        vec![
            Competency::new("Python", 4, Some("technical")).unwrap(),
            Competency::new("System Design", 3, Some("technical")).unwrap(),
            Competency::new("Leadership", 2, Some("soft")).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_round_trip_preserves_competency_order() {
        let pool = memory_pool().await;
        let role = JobRoleSummary::new("Backend Engineer", "Builds APIs", 6).unwrap();

        add_job_role(&pool, &role, &sample_competencies(), Some(&[1.0, 0.0]))
            .await
            .unwrap();

        let stored = get_job_role_with_competencies(&pool, role.job_role_id)
            .await
            .unwrap()
            .expect("role should exist");
        assert_eq!(stored.job_role, role);
        assert_eq!(stored.competencies, sample_competencies());
    }

    #[tokio::test]
    async fn test_re_adding_replaces_competencies() {
        let pool = memory_pool().await;
        let role = JobRoleSummary::new("Backend Engineer", "Builds APIs", 6).unwrap();
        add_job_role(&pool, &role, &sample_competencies(), None).await.unwrap();

        let replacement = vec![Competency::new("Go", 5, None).unwrap()];
        add_job_role(&pool, &role, &replacement, None).await.unwrap();

        let stored = get_job_role_with_competencies(&pool, role.job_role_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.competencies, replacement);
    }

    #[tokio::test]
    async fn test_missing_role_is_none() {
        let pool = memory_pool().await;
        let found = get_job_role_with_competencies(&pool, Uuid::new_v4()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_embeddings_listed_with_roles() {
        let pool = memory_pool().await;
        let with = JobRoleSummary::new("A", "a", 1).unwrap();
        let without = JobRoleSummary::new("B", "b", 2).unwrap();
        add_job_role(&pool, &with, &[], Some(&[0.5, 0.25])).await.unwrap();
        add_job_role(&pool, &without, &[], None).await.unwrap();

        let mut listed = job_role_embeddings(&pool).await.unwrap();
        listed.sort_by(|a, b| a.0.job_title.cmp(&b.0.job_title));
        assert_eq!(listed[0].1, vec![0.5, 0.25]);
        assert!(listed[1].1.is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_database_persists_across_pools() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("roles.db").display());
        let role = JobRoleSummary::new("Analyst", "Reads data", 3).unwrap();

        {
            let pool = crate::db::create_pool(&url).await.unwrap();
            ensure_schema(&pool).await.unwrap();
            add_job_role(&pool, &role, &sample_competencies(), None).await.unwrap();
            pool.close().await;
        }

        let pool = crate::db::create_pool(&url).await.unwrap();
        let stored = get_job_role_with_competencies(&pool, role.job_role_id)
            .await
            .unwrap();
        assert!(stored.is_some());
    }
}
