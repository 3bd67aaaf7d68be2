//! Repository trait definitions for customer storage.
//!
//! - [`error`]: Error types for repository operations
//! - [`customer`]: The [`CustomerRepository`] contract every backend implements
//!
//! Handlers and services only ever see `Arc<dyn CustomerRepository>`, so the
//! in-memory and Postgres backends are interchangeable at runtime.

pub mod customer;
pub mod error;

pub use customer::CustomerRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
