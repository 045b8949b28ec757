//! Pipeline domain types
//!
//! A pipeline is a deployable `(project, environment)` pair. Its lock state is
//! a single record: an empty `locked_by` means unlocked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValidationError;

/// Joins project and environment inside a canonical key.
///
/// Validation rejects identifiers containing it, so two distinct pairs can
/// never produce the same key.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Characters no project or environment may contain: the key separator, and
/// NUL, which PostgreSQL text columns cannot store.
const RESERVED_CHARS: [char; 2] = [KEY_SEPARATOR, '\0'];

/// Normalization applied when deriving storage keys.
///
/// Fixed at startup and shared by every repository backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPolicy {
    pub case_sensitive: bool,
}

impl KeyPolicy {
    pub const fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
        }
    }

    pub const fn case_insensitive() -> Self {
        Self {
            case_sensitive: false,
        }
    }
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self::case_sensitive()
    }
}

/// Identity of a deployable unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineIdentifier {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub environment: String,
}

impl PipelineIdentifier {
    pub fn new(project: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
        }
    }

    /// Checks the identifier, project first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project.is_empty() {
            return Err(ValidationError::ProjectEmpty);
        }
        if self.environment.is_empty() {
            return Err(ValidationError::EnvironmentEmpty);
        }
        if self.project.contains(RESERVED_CHARS) {
            return Err(ValidationError::ProjectInvalid);
        }
        if self.environment.contains(RESERVED_CHARS) {
            return Err(ValidationError::EnvironmentInvalid);
        }

        Ok(())
    }

    /// Canonical storage key for this identifier under `policy`.
    ///
    /// With a case-insensitive policy `Area51/Prod` and `area51/prod` map to
    /// the same key.
    pub fn key(&self, policy: KeyPolicy) -> String {
        let mut key =
            String::with_capacity(self.project.len() + self.environment.len() + 1);

        if policy.case_sensitive {
            key.push_str(&self.project);
            key.push(KEY_SEPARATOR);
            key.push_str(&self.environment);
        } else {
            key.push_str(&self.project.to_lowercase());
            key.push(KEY_SEPARATOR);
            key.push_str(&self.environment.to_lowercase());
        }

        key
    }
}

impl fmt::Display for PipelineIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.environment)
    }
}

/// Lock record of a pipeline
///
/// Serializes to a flat object: `project`, `environment`, `locked_by`,
/// `locked_at`. This is both the HTTP representation and the value stored by
/// key-value backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(flatten)]
    pub identifier: PipelineIdentifier,
    #[serde(default)]
    pub locked_by: String,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    /// Record of `identifier` held by `locked_by` since `locked_at`
    pub fn locked(
        identifier: PipelineIdentifier,
        locked_by: impl Into<String>,
        locked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identifier,
            locked_by: locked_by.into(),
            locked_at: Some(locked_at),
        }
    }

    /// Record written by an unlock
    pub fn unlocked(identifier: PipelineIdentifier) -> Self {
        Self {
            identifier,
            locked_by: String::new(),
            locked_at: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.locked_by.is_empty()
    }

    pub fn key(&self, policy: KeyPolicy) -> String {
        self.identifier.key(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identifier() -> PipelineIdentifier {
        PipelineIdentifier::new("area51", "production")
    }

    #[test]
    fn test_validate_valid_identifier() {
        assert_eq!(identifier().validate(), Ok(()));
    }

    #[test]
    fn test_validate_empty_project_wins_over_empty_environment() {
        let id = PipelineIdentifier::new("", "");
        assert_eq!(id.validate(), Err(ValidationError::ProjectEmpty));
    }

    #[test]
    fn test_validate_empty_environment() {
        let id = PipelineIdentifier::new("area51", "");
        assert_eq!(id.validate(), Err(ValidationError::EnvironmentEmpty));
    }

    #[test]
    fn test_validate_rejects_separator() {
        let project = format!("a{}b", KEY_SEPARATOR);
        let id = PipelineIdentifier::new(project.clone(), "prod");
        assert_eq!(id.validate(), Err(ValidationError::ProjectInvalid));

        let id = PipelineIdentifier::new("area51", project);
        assert_eq!(id.validate(), Err(ValidationError::EnvironmentInvalid));
    }

    #[test]
    fn test_validate_rejects_nul() {
        let id = PipelineIdentifier::new("a\0b", "prod");
        assert_eq!(id.validate(), Err(ValidationError::ProjectInvalid));

        let id = PipelineIdentifier::new("area51", "prod\0");
        assert_eq!(id.validate(), Err(ValidationError::EnvironmentInvalid));
    }

    #[test]
    fn test_key_case_sensitive_keeps_case() {
        let upper = PipelineIdentifier::new("Area51", "Prod");
        let lower = PipelineIdentifier::new("area51", "prod");

        let policy = KeyPolicy::case_sensitive();
        assert_ne!(upper.key(policy), lower.key(policy));
        assert_eq!(upper.key(policy), format!("Area51{}Prod", KEY_SEPARATOR));
    }

    #[test]
    fn test_key_case_insensitive_collides() {
        let upper = PipelineIdentifier::new("Area51", "Prod");
        let lower = PipelineIdentifier::new("area51", "prod");

        let policy = KeyPolicy::case_insensitive();
        assert_eq!(upper.key(policy), lower.key(policy));
    }

    #[test]
    fn test_key_distinct_pairs_do_not_collide() {
        // Would collide with a ':' separator
        let a = PipelineIdentifier::new("a:b", "c");
        let b = PipelineIdentifier::new("a", "b:c");
        assert_ne!(a.key(KeyPolicy::default()), b.key(KeyPolicy::default()));
    }

    #[test]
    fn test_default_policy_is_case_sensitive() {
        assert!(KeyPolicy::default().case_sensitive);
    }

    #[test]
    fn test_pipeline_lock_state() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(Pipeline::locked(identifier(), "bob", at).is_locked());
        assert!(!Pipeline::unlocked(identifier()).is_locked());
    }

    #[test]
    fn test_pipeline_serializes_flat() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let pipeline = Pipeline::locked(identifier(), "bob", at);

        let value = serde_json::to_value(&pipeline).unwrap();
        assert_eq!(value["project"], "area51");
        assert_eq!(value["environment"], "production");
        assert_eq!(value["locked_by"], "bob");
        assert_eq!(value["locked_at"], "2024-05-01T12:00:00Z");

        let decoded: Pipeline = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, pipeline);
    }

    #[test]
    fn test_pipeline_deserializes_missing_lock_fields_as_unlocked() {
        let decoded: Pipeline =
            serde_json::from_str(r#"{"project":"area51","environment":"production"}"#).unwrap();
        assert_eq!(decoded, Pipeline::unlocked(identifier()));
    }
}
