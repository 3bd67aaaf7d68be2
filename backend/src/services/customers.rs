//! Customer service.
//!
//! A thin pass-through over [`CustomerRepository`]. Uniqueness is enforced by
//! the repository on write; [`CustomerService::find_conflict`] is only a
//! cheap pre-check that lets callers answer before attempting the write.

use std::sync::Arc;

use crate::db::repository::{CustomerRepository, RepositoryResult};
use crate::models::{Customer, CustomerId, UniqueField};

#[derive(Clone)]
pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    pub async fn health_check(&self) -> RepositoryResult<bool> {
        self.repository.health_check().await
    }

    /// Insert (no id) or update (with id) a customer.
    pub async fn save(&self, customer: &Customer) -> RepositoryResult<Customer> {
        let saved = self.repository.save(customer).await?;
        log::debug!(
            "Saved customer id={:?} username={}",
            saved.id.map(|id| id.value()),
            saved.username
        );
        Ok(saved)
    }

    pub async fn find_all(&self) -> RepositoryResult<Vec<Customer>> {
        self.repository.find_all().await
    }

    pub async fn find_by_id(&self, id: CustomerId) -> RepositoryResult<Option<Customer>> {
        self.repository.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Customer>> {
        self.repository.find_by_email(email).await
    }

    pub async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Customer>> {
        self.repository.find_by_username(username).await
    }

    /// First unique field of `customer` already held by a customer other
    /// than `owner`. Email is checked before username.
    pub async fn find_conflict(
        &self,
        customer: &Customer,
        owner: Option<CustomerId>,
    ) -> RepositoryResult<Option<UniqueField>> {
        for field in UniqueField::ALL {
            let value = customer.unique_value(field);
            let holder = match field {
                UniqueField::Email => self.find_by_email(value).await?,
                UniqueField::Username => self.find_by_username(value).await?,
            };
            if let Some(holder) = holder {
                if owner.is_none() || holder.id != owner {
                    log::debug!("Pre-check found {} conflict for '{}'", field, value);
                    return Ok(Some(field));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "customers_tests.rs"]
mod customers_tests;
