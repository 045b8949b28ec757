//! Repository Module
//!
//! Storage layer for pipeline lock records.
//! Every backend implements [`PipelineRepository`] and derives its keys from
//! the same [`KeyPolicy`], so a pipeline maps to the same record whichever
//! backend is selected at startup.

pub mod memory;
pub mod postgres;
pub mod redis;

use async_trait::async_trait;
use locker_core::domain::{KeyPolicy, Pipeline, PipelineIdentifier};
use std::sync::Arc;
use thiserror::Error;

use crate::config::StorageBackend;
use crate::db;

pub use memory::MemoryPipelineRepository;
pub use postgres::PostgresPipelineRepository;
pub use self::redis::RedisPipelineRepository;

/// Backend I/O or (de)serialization failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed record at key {key:?}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("in-memory store poisoned: {0}")]
    Poisoned(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Persistence contract for pipeline lock records
#[async_trait]
pub trait PipelineRepository: Send + Sync {
    /// Looks up the record at the identifier's key. `None` when nothing was
    /// ever written there.
    async fn find(&self, identifier: &PipelineIdentifier) -> Result<Option<Pipeline>>;

    /// Overwrites the record at the pipeline's key.
    async fn add(&self, pipeline: Pipeline) -> Result<()>;

    /// Writes the record only if its key holds no locked record, as one
    /// atomic step. Returns whether the write happened.
    async fn try_acquire(&self, pipeline: Pipeline) -> Result<bool>;

    /// Every record with a non-empty owner, in no particular order.
    async fn find_locked_pipelines(&self) -> Result<Vec<Pipeline>>;
}

/// Builds the repository selected by configuration
pub async fn connect(
    backend: &StorageBackend,
    policy: KeyPolicy,
) -> Result<Arc<dyn PipelineRepository>> {
    match backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, locks are not shared between instances");
            Ok(Arc::new(MemoryPipelineRepository::new(policy)))
        }
        StorageBackend::Redis { url, namespace } => {
            tracing::info!("Connecting to Redis...");
            let repository = RedisPipelineRepository::connect(url, namespace, policy).await?;
            Ok(Arc::new(repository))
        }
        StorageBackend::Postgres { url } => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PostgresPipelineRepository::new(pool, policy)))
        }
    }
}
