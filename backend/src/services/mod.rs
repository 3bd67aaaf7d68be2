//! Service layer between the HTTP handlers and the repository.
//!
//! Services hold an `Arc<dyn CustomerRepository>` so the backing store can be
//! swapped for tests without touching the handlers.

pub mod customers;

pub use customers::CustomerService;
