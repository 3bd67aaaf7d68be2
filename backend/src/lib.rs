//! # customerdb
//!
//! Customer registry: register, list, look up and update customers over a
//! JSON HTTP API, with email and username kept unique across all records.
//!
//! ## Architecture
//!
//! - [`models`]: the customer entity, inbound payload and validation rules
//! - [`db`]: repository trait plus in-memory and Postgres backends
//! - [`services`]: service layer the handlers call into
//! - [`http`]: Axum router, handlers and error mapping (feature `http-server`)

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
