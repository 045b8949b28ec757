//! Locker Server
//!
//! HTTP service that hands out named locks on `(project, environment)`
//! pipelines so deployments do not overlap.
//!
//! Architecture:
//! - Repository: lock record storage (in-memory, Redis or PostgreSQL)
//! - Service: validation and the overlocking policy
//! - API: JSON endpoints and the HTML dashboard
//! - Config: environment configuration read once at startup

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod views;
