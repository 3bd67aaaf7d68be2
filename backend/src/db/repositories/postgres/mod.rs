//! Postgres repository implementation using Diesel.
//!
//! Customers live in a single `customers` table whose `email` and `username`
//! columns carry `UNIQUE` constraints; a violation surfaces as
//! [`RepositoryError::Conflict`].
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{CustomerRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{Customer, CustomerId};

mod models;
mod schema;

use models::*;
use schema::customers;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// See the module documentation for the variables read and their defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed customer repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }
        log::info!(
            "Postgres repository ready (pool max={}, min={})",
            config.max_pool_size,
            config.min_pool_size
        );

        Ok(Self { pool, config })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Diesel is blocking, so the operation runs on the blocking thread pool.
    /// Retryable errors (connection errors, serialization failures) are retried
    /// up to `max_retries` times with exponential back-off.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            log::warn!("Connection attempt {} failed: {}", attempt + 1, err);
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        log::warn!("Retrying after transient error: {}", e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error, operation: &str) -> RepositoryError {
    RepositoryError::from(err).with_operation(operation)
}

#[async_trait]
impl CustomerRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map_err(|e| map_diesel_error(e, "health_check"))?;
            Ok(true)
        })
        .await
    }

    async fn save(&self, customer: &Customer) -> RepositoryResult<Customer> {
        match customer.id {
            None => {
                let row = NewCustomerRow::from(customer);
                self.with_conn(move |conn| {
                    diesel::insert_into(customers::table)
                        .values(&row)
                        .returning(CustomerRow::as_returning())
                        .get_result::<CustomerRow>(conn)
                        .map(Customer::from)
                        .map_err(|e| map_diesel_error(e, "insert_customer"))
                })
                .await
            }
            Some(id) => {
                let changeset = CustomerChangeset::from(customer);
                self.with_conn(move |conn| {
                    diesel::update(customers::table.find(id.value()))
                        .set(&changeset)
                        .returning(CustomerRow::as_returning())
                        .get_result::<CustomerRow>(conn)
                        .optional()
                        .map_err(|e| map_diesel_error(e, "update_customer"))?
                        .map(Customer::from)
                        .ok_or_else(|| {
                            RepositoryError::not_found_with_context(
                                format!("Customer {} not found", id),
                                ErrorContext::new("update_customer")
                                    .with_entity("customer")
                                    .with_entity_id(id),
                            )
                        })
                })
                .await
            }
        }
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Customer>> {
        self.with_conn(|conn| {
            let rows = customers::table
                .order(customers::customer_id.asc())
                .select(CustomerRow::as_select())
                .load::<CustomerRow>(conn)
                .map_err(|e| map_diesel_error(e, "find_all"))?;
            Ok(rows.into_iter().map(Customer::from).collect())
        })
        .await
    }

    async fn find_by_id(&self, id: CustomerId) -> RepositoryResult<Option<Customer>> {
        self.with_conn(move |conn| {
            customers::table
                .find(id.value())
                .select(CustomerRow::as_select())
                .first::<CustomerRow>(conn)
                .optional()
                .map(|row| row.map(Customer::from))
                .map_err(|e| map_diesel_error(e, "find_by_id"))
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Customer>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            customers::table
                .filter(customers::email.eq(&email))
                .select(CustomerRow::as_select())
                .first::<CustomerRow>(conn)
                .optional()
                .map(|row| row.map(Customer::from))
                .map_err(|e| map_diesel_error(e, "find_by_email"))
        })
        .await
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Customer>> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            customers::table
                .filter(customers::username.eq(&username))
                .select(CustomerRow::as_select())
                .first::<CustomerRow>(conn)
                .optional()
                .map(|row| row.map(Customer::from))
                .map_err(|e| map_diesel_error(e, "find_by_username"))
        })
        .await
    }
}
