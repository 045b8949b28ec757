//! PostgreSQL pipeline repository
//!
//! One row per canonical key in `pipeline_locks`. Writes are upserts, so a
//! key always holds exactly the last record written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use locker_core::domain::{KeyPolicy, Pipeline, PipelineIdentifier};
use sqlx::PgPool;

use super::{PipelineRepository, Result};

#[derive(Debug, Clone)]
pub struct PostgresPipelineRepository {
    pool: PgPool,
    policy: KeyPolicy,
}

impl PostgresPipelineRepository {
    pub fn new(pool: PgPool, policy: KeyPolicy) -> Self {
        Self { pool, policy }
    }
}

#[async_trait]
impl PipelineRepository for PostgresPipelineRepository {
    async fn find(&self, identifier: &PipelineIdentifier) -> Result<Option<Pipeline>> {
        let row = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT project, environment, locked_by, locked_at
            FROM pipeline_locks
            WHERE key = $1
            "#,
        )
        .bind(identifier.key(self.policy))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn add(&self, pipeline: Pipeline) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pipeline_locks (key, project, environment, locked_by, locked_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (key) DO UPDATE
            SET project = EXCLUDED.project,
                environment = EXCLUDED.environment,
                locked_by = EXCLUDED.locked_by,
                locked_at = EXCLUDED.locked_at
            "#,
        )
        .bind(pipeline.key(self.policy))
        .bind(&pipeline.identifier.project)
        .bind(&pipeline.identifier.environment)
        .bind(&pipeline.locked_by)
        .bind(pipeline.locked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn try_acquire(&self, pipeline: Pipeline) -> Result<bool> {
        // The conditional update skips rows that are locked, leaving zero
        // rows affected.
        let result = sqlx::query(
            r#"
            INSERT INTO pipeline_locks (key, project, environment, locked_by, locked_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (key) DO UPDATE
            SET project = EXCLUDED.project,
                environment = EXCLUDED.environment,
                locked_by = EXCLUDED.locked_by,
                locked_at = EXCLUDED.locked_at
            WHERE pipeline_locks.locked_by = ''
            "#,
        )
        .bind(pipeline.key(self.policy))
        .bind(&pipeline.identifier.project)
        .bind(&pipeline.identifier.environment)
        .bind(&pipeline.locked_by)
        .bind(pipeline.locked_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_locked_pipelines(&self) -> Result<Vec<Pipeline>> {
        let rows = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT project, environment, locked_by, locked_at
            FROM pipeline_locks
            WHERE locked_by <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    project: String,
    environment: String,
    locked_by: String,
    locked_at: Option<DateTime<Utc>>,
}

impl From<PipelineRow> for Pipeline {
    fn from(row: PipelineRow) -> Self {
        Pipeline {
            identifier: PipelineIdentifier {
                project: row.project,
                environment: row.environment,
            },
            locked_by: row.locked_by,
            locked_at: row.locked_at,
        }
    }
}
