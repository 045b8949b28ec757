//! Pipeline DTOs

use serde::{Deserialize, Serialize};

use crate::domain::{PipelineIdentifier, ValidationError};

/// Request to lock a pipeline
///
/// Serialized flat: `{"project": .., "environment": .., "locked_by": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    #[serde(flatten)]
    pub identifier: PipelineIdentifier,
    #[serde(default)]
    pub locked_by: String,
}

impl LockRequest {
    pub fn new(identifier: PipelineIdentifier, locked_by: impl Into<String>) -> Self {
        Self {
            identifier,
            locked_by: locked_by.into(),
        }
    }

    /// Identifier rules first, then a non-empty owner.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.identifier.validate()?;
        if self.locked_by.is_empty() {
            return Err(ValidationError::LockedByEmpty);
        }

        Ok(())
    }
}
