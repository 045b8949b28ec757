//! In-memory pipeline repository
//!
//! Process-local storage for single-instance deployments and tests. State is
//! lost on shutdown and is not visible to other server instances.

use async_trait::async_trait;
use locker_core::domain::{KeyPolicy, Pipeline, PipelineIdentifier};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{PipelineRepository, Result, StorageError};

/// Key to record map behind a mutex, guarding reads and writes alike
#[derive(Debug)]
pub struct MemoryPipelineRepository {
    store: Mutex<HashMap<String, Pipeline>>,
    policy: KeyPolicy,
}

impl MemoryPipelineRepository {
    pub fn new(policy: KeyPolicy) -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
            policy,
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, HashMap<String, Pipeline>>> {
        self.store
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryPipelineRepository {
    fn default() -> Self {
        Self::new(KeyPolicy::default())
    }
}

#[async_trait]
impl PipelineRepository for MemoryPipelineRepository {
    async fn find(&self, identifier: &PipelineIdentifier) -> Result<Option<Pipeline>> {
        let key = identifier.key(self.policy);
        Ok(self.store()?.get(&key).cloned())
    }

    async fn add(&self, pipeline: Pipeline) -> Result<()> {
        let key = pipeline.key(self.policy);
        self.store()?.insert(key, pipeline);
        Ok(())
    }

    async fn try_acquire(&self, pipeline: Pipeline) -> Result<bool> {
        let key = pipeline.key(self.policy);
        let mut store = self.store()?;

        if store.get(&key).is_some_and(Pipeline::is_locked) {
            return Ok(false);
        }

        store.insert(key, pipeline);
        Ok(true)
    }

    async fn find_locked_pipelines(&self) -> Result<Vec<Pipeline>> {
        Ok(self
            .store()?
            .values()
            .filter(|p| p.is_locked())
            .cloned()
            .collect())
    }
}
