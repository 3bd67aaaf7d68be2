//! Data Transfer Objects for the HTTP API.
//!
//! Customers are exchanged as [`Customer`](crate::models::Customer) on the way
//! out and [`CustomerPayload`](crate::models::CustomerPayload) on the way in;
//! only responses without a model counterpart live here.

use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the crate serving the API
    pub version: String,
    /// Database connection status
    pub database: String,
}
