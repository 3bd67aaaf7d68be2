//! Customer repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Customer, CustomerId};

/// Durable keyed storage for customers.
///
/// Email and username are unique across all stored customers. Implementations
/// must enforce that themselves and reject a violating write with
/// [`RepositoryError::Conflict`](super::RepositoryError::Conflict); callers may
/// pre-check with the `find_by_*` lookups but those checks are not atomic with
/// the write.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert or update a customer.
    ///
    /// A customer without an id is inserted and returned with its newly
    /// assigned id. A customer with an id replaces the stored row with that id.
    ///
    /// # Returns
    /// * `Ok(Customer)` - The persisted record
    /// * `Err(RepositoryError::Conflict)` - If email or username is taken by another customer
    /// * `Err(RepositoryError::NotFound)` - If updating an id that does not exist
    async fn save(&self, customer: &Customer) -> RepositoryResult<Customer>;

    /// Every stored customer, ordered by id.
    async fn find_all(&self) -> RepositoryResult<Vec<Customer>>;

    async fn find_by_id(&self, id: CustomerId) -> RepositoryResult<Option<Customer>>;

    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Customer>>;

    /// Exact-match lookup by username.
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Customer>>;
}
