//! Validation errors for caller supplied input

use thiserror::Error;

/// Rejection of a malformed identifier or lock request.
///
/// The display form is the machine readable code returned to HTTP callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("REQUEST_PROJECT_EMPTY")]
    ProjectEmpty,

    #[error("REQUEST_ENVIRONMENT_EMPTY")]
    EnvironmentEmpty,

    #[error("REQUEST_LOCKED_BY_EMPTY")]
    LockedByEmpty,

    /// Project contains the key separator
    #[error("REQUEST_PROJECT_INVALID")]
    ProjectInvalid,

    /// Environment contains the key separator
    #[error("REQUEST_ENVIRONMENT_INVALID")]
    EnvironmentInvalid,
}
