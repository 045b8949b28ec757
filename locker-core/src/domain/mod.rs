//! Core domain types
//!
//! This module contains the domain structures shared by every locker crate.
//! The server persists them, the client and CLI receive them over HTTP.

pub mod error;
pub mod pipeline;

pub use error::ValidationError;
pub use pipeline::{KEY_SEPARATOR, KeyPolicy, Pipeline, PipelineIdentifier};
