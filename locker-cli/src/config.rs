//! Configuration module
//!
//! Handles CLI configuration: the locker URL and who is taking locks.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the locker service
    pub locker_url: String,
}

/// Picks the lock owner: an explicit value first, then `$USER`.
pub fn resolve_owner<F>(explicit: Option<String>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .filter(|owner| !owner.is_empty())
        .or_else(|| lookup("USER").filter(|owner| !owner.is_empty()))
}
