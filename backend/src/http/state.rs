//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::CustomerRepository;
use crate::services::CustomerService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub customers: CustomerService,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self {
            customers: CustomerService::new(repository),
        }
    }
}
