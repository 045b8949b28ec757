//! Data Transfer Objects for the locker HTTP API
//!
//! Request and response bodies exchanged between the server, the client
//! library and the CLI.

pub mod pipeline;

use serde::{Deserialize, Serialize};

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
