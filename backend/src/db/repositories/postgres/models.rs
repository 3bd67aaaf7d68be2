use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::customers;
use crate::models::{Customer, CustomerId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // timestamps are kept for auditing, not exposed through the API
pub struct CustomerRow {
    pub customer_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub username: String,
    pub password_digest: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: Some(CustomerId(row.customer_id)),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            username: row.username,
            password_digest: row.password_digest,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomerRow {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub username: String,
    pub password_digest: Option<String>,
}

impl From<&Customer> for NewCustomerRow {
    fn from(customer: &Customer) -> Self {
        Self {
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            username: customer.username.clone(),
            password_digest: customer.password_digest.clone(),
        }
    }
}

/// Full replacement of the mutable columns; `None` writes NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(treat_none_as_null = true)]
pub struct CustomerChangeset {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub username: String,
    pub password_digest: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerChangeset {
    fn from(customer: &Customer) -> Self {
        Self {
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            username: customer.username.clone(),
            password_digest: customer.password_digest.clone(),
            updated_at: Utc::now(),
        }
    }
}
