//! Service Module
//!
//! Business logic layer for the locker.
//! The lock service validates requests, applies the overlocking policy and
//! is the only caller of the pipeline repository.

pub mod lock;

// Re-export for convenience
pub use lock as lock_service;
pub use lock::{LockError, LockPolicy, LockService};
