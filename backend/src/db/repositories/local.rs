//! In-memory local repository implementation.
//!
//! This module provides a local implementation of [`CustomerRepository`]
//! suitable for unit testing and local development. All data is stored in
//! memory behind a single lock, so the uniqueness checks and the write they
//! guard happen atomically.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::{CustomerRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{Customer, CustomerId, UniqueField};

/// In-memory local repository.
///
/// # Example
/// ```
/// use customerdb::db::repositories::LocalRepository;
/// use customerdb::db::repository::CustomerRepository;
/// use customerdb::models::Customer;
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// let saved = repo.save(&Customer::new("a@b.com", "alice")).await.unwrap();
/// assert_eq!(saved.id.map(|id| id.value()), Some(1));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    // BTreeMap keeps find_all in id order
    customers: BTreeMap<CustomerId, Customer>,
    email_index: HashMap<String, CustomerId>,
    username_index: HashMap<String, CustomerId>,

    // ID counter
    next_customer_id: CustomerId,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            customers: BTreeMap::new(),
            email_index: HashMap::new(),
            username_index: HashMap::new(),
            next_customer_id: CustomerId(1),
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn index(&self, field: UniqueField) -> &HashMap<String, CustomerId> {
        match field {
            UniqueField::Email => &self.email_index,
            UniqueField::Username => &self.username_index,
        }
    }

    fn index_mut(&mut self, field: UniqueField) -> &mut HashMap<String, CustomerId> {
        match field {
            UniqueField::Email => &mut self.email_index,
            UniqueField::Username => &mut self.username_index,
        }
    }

    /// Fail if any unique value of `customer` belongs to a customer other than `owner`.
    fn check_unique(&self, customer: &Customer, owner: Option<CustomerId>) -> RepositoryResult<()> {
        for field in UniqueField::ALL {
            let value = customer.unique_value(field);
            if let Some(holder) = self.index(field).get(value) {
                if Some(*holder) != owner {
                    return Err(RepositoryError::conflict(
                        field,
                        ErrorContext::new("save")
                            .with_entity("customer")
                            .with_entity_id(holder)
                            .with_details(format!("{}={}", field, value)),
                    ));
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, customer: &Customer) -> RepositoryResult<Customer> {
        self.check_unique(customer, None)?;

        let id = self.next_customer_id;
        self.next_customer_id = CustomerId(id.0 + 1);

        let mut stored = customer.clone();
        stored.id = Some(id);
        for field in UniqueField::ALL {
            let value = stored.unique_value(field).to_string();
            self.index_mut(field).insert(value, id);
        }
        self.customers.insert(id, stored.clone());
        Ok(stored)
    }

    fn update(&mut self, id: CustomerId, customer: &Customer) -> RepositoryResult<Customer> {
        let previous = self.customers.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Customer {} not found", id),
                ErrorContext::new("save").with_entity("customer").with_entity_id(id),
            )
        })?;
        self.check_unique(customer, Some(id))?;

        for field in UniqueField::ALL {
            let old = previous.unique_value(field);
            let new = customer.unique_value(field);
            if old != new {
                let index = self.index_mut(field);
                index.remove(old);
                index.insert(new.to_string(), id);
            }
        }
        self.customers.insert(id, customer.clone());
        Ok(customer.clone())
    }

    fn find_by(&self, field: UniqueField, value: &str) -> Option<Customer> {
        self.index(field)
            .get(value)
            .and_then(|id| self.customers.get(id))
            .cloned()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository and restart id allocation at 1.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of customers stored.
    pub fn customer_count(&self) -> usize {
        self.data.read().customers.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new("check_health"),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn save(&self, customer: &Customer) -> RepositoryResult<Customer> {
        self.check_health()?;

        let mut data = self.data.write();
        match customer.id {
            None => data.insert(customer),
            Some(id) => data.update(id, customer),
        }
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Customer>> {
        self.check_health()?;
        Ok(self.data.read().customers.values().cloned().collect())
    }

    async fn find_by_id(&self, id: CustomerId) -> RepositoryResult<Option<Customer>> {
        self.check_health()?;
        Ok(self.data.read().customers.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Customer>> {
        self.check_health()?;
        Ok(self.data.read().find_by(UniqueField::Email, email))
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Customer>> {
        self.check_health()?;
        Ok(self.data.read().find_by(UniqueField::Username, username))
    }
}
