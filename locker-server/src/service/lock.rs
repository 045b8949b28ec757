//! Lock Service
//!
//! Deploy checks, locking and unlocking of pipelines.
//!
//! A pipeline is UNLOCKED when it has no record or its record has an empty
//! owner, and LOCKED otherwise. Records are never deleted: unlocking writes a
//! record with an empty owner.

use chrono::{DateTime, SubsecRound, Utc};
use locker_core::domain::{Pipeline, PipelineIdentifier, ValidationError};
use locker_core::dto::pipeline::LockRequest;
use std::sync::Arc;
use thiserror::Error;

use crate::repository::{PipelineRepository, StorageError};

/// Service error type
#[derive(Debug, Error)]
pub enum LockError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("PIPELINE_ALREADY_LOCKED")]
    AlreadyLocked,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, LockError>;

/// Locking policy, fixed at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockPolicy {
    /// Lock requests replace existing locks instead of failing
    pub allow_overlocking: bool,
}

pub struct LockService {
    repository: Arc<dyn PipelineRepository>,
    policy: LockPolicy,
}

impl LockService {
    pub fn new(repository: Arc<dyn PipelineRepository>, policy: LockPolicy) -> Self {
        Self { repository, policy }
    }

    /// Whether `identifier` may be deployed, i.e. nobody holds its lock
    pub async fn is_deploy_allowed(&self, identifier: &PipelineIdentifier) -> Result<bool> {
        identifier.validate()?;

        let pipeline = self.repository.find(identifier).await?;
        let allowed = pipeline.is_none_or(|p| !p.is_locked());

        tracing::debug!("Deploy of {} allowed: {}", identifier, allowed);

        Ok(allowed)
    }

    /// Lock a pipeline
    ///
    /// Without overlocking, the lock is only taken when nobody holds it. The
    /// check and the write are a single atomic repository call, so of several
    /// concurrent requests exactly one succeeds. With overlocking, any
    /// existing lock is replaced.
    ///
    /// Returns the stored record.
    pub async fn lock(&self, req: LockRequest) -> Result<Pipeline> {
        req.validate()?;

        let pipeline = Pipeline::locked(req.identifier, req.locked_by, lock_time());

        if self.policy.allow_overlocking {
            self.repository.add(pipeline.clone()).await?;
        } else if !self.repository.try_acquire(pipeline.clone()).await? {
            tracing::warn!(
                "Lock of {} by {} rejected, pipeline is already locked",
                pipeline.identifier,
                pipeline.locked_by
            );
            return Err(LockError::AlreadyLocked);
        }

        tracing::info!(
            "Pipeline {} locked by {}",
            pipeline.identifier,
            pipeline.locked_by
        );

        Ok(pipeline)
    }

    /// Unlock a pipeline
    ///
    /// Unlocking a pipeline that is not locked succeeds.
    pub async fn unlock(&self, identifier: &PipelineIdentifier) -> Result<()> {
        identifier.validate()?;

        self.repository
            .add(Pipeline::unlocked(identifier.clone()))
            .await?;

        tracing::info!("Pipeline {} unlocked", identifier);

        Ok(())
    }

    /// List every locked pipeline
    pub async fn get_locked_pipelines(&self) -> Result<Vec<Pipeline>> {
        let pipelines = self.repository.find_locked_pipelines().await?;
        Ok(pipelines)
    }
}

/// Current time at the microsecond precision every backend stores
fn lock_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
