//! Database operations for the Slotwise `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `tenant` - Businesses subscribed to Slotwise
//! - `app_user` - Dashboard accounts (auth + refresh tokens)
//! - `tenant_settings` - Booking policy per tenant
//! - `customer`, `employee`, `service`, `appointment` - Tenant-scoped aggregates
//! - `employee_service` - Which employees perform which services
//!
//! Every tenant-scoped query filters by `tenant_id` (lists) and
//! `deleted_at IS NULL` (always). Audit stamps (`created_by`, `updated_by`,
//! `deleted_by`, timestamps) are written by the SQL statements themselves.
//!
//! Queries use the runtime `query`/`query_as` API with `FromRow` row structs
//! converted into domain models, so the crate builds without a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p slotwise-cli -- migrate
//! ```

pub mod appointments;
pub mod customers;
pub mod employees;
pub mod services;
pub mod settings;
pub mod tenants;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use appointments::{AppointmentFilter, AppointmentRepository};
pub use customers::CustomerRepository;
pub use employees::EmployeeRepository;
pub use services::ServiceRepository;
pub use settings::SettingsRepository;
pub use tenants::TenantRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email or slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique violation to `Conflict` with the given message.
fn map_unique_violation(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}
