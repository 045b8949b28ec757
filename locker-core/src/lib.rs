//! Locker Core
//!
//! Core types and abstractions for the pipeline locker.
//!
//! This crate contains:
//! - Domain types: pipeline identity, lock records and the canonical key model
//! - DTOs: request and error bodies shared by the server and its clients

pub mod domain;
pub mod dto;
