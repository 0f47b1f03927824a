//! Customer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use slotwise_core::{CustomerId, PageParams, TenantId, UserId};

use super::RepositoryError;
use crate::models::customer::Customer;

/// Internal row type for customer queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    tenant_id: TenantId,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Option<UserId>,
    updated_by: Option<UserId>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
        }
    }
}

const CUSTOMER_COLUMNS: &str = "id, tenant_id, first_name, last_name, email, phone, notes, \
     created_at, updated_at, created_by, updated_by";

/// Sortable columns; anything else falls back to `created_at`.
fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("first_name") => "first_name",
        Some("last_name") => "last_name",
        Some("email") => "email",
        _ => "created_at",
    }
}

/// Fields for creating a customer.
#[derive(Debug)]
pub struct NewCustomer<'a> {
    pub tenant_id: TenantId,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub actor: Option<UserId>,
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by id. Not scoped by tenant: the handler compares the
    /// returned tenant id against the request's and rejects mismatches as
    /// Forbidden.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a tenant's customers with paging, search, and sorting.
    ///
    /// Search matches name and email case-insensitively. Returns the page of
    /// customers plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        params: &PageParams,
    ) -> Result<(Vec<Customer>, i64), RepositoryError> {
        let search = params.search.clone().unwrap_or_default();
        let order = sort_column(params.sort_by.as_deref());
        let direction = if params.sort_asc { "ASC" } else { "DESC" };

        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS}
             FROM customer
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2 = '' OR first_name ILIKE '%' || $2 || '%'
                    OR last_name ILIKE '%' || $2 || '%'
                    OR email ILIKE '%' || $2 || '%')
             ORDER BY {order} {direction}
             LIMIT $3 OFFSET $4"
        ))
        .bind(tenant_id)
        .bind(&search)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
             FROM customer
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2 = '' OR first_name ILIKE '%' || $2 || '%'
                    OR last_name ILIKE '%' || $2 || '%'
                    OR email ILIKE '%' || $2 || '%')",
        )
        .bind(tenant_id)
        .bind(&search)
        .fetch_one(self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Create a new customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, new: NewCustomer<'_>) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO customer
                 (id, tenant_id, first_name, last_name, email, phone, notes, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(CustomerId::generate())
        .bind(new.tenant_id)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.notes)
        .bind(new.actor)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a customer's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: CustomerId,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        notes: Option<&str>,
        actor: Option<UserId>,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE customer
             SET first_name = $2, last_name = $3, email = $4, phone = $5, notes = $6,
                 updated_at = now(), updated_by = $7
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(phone)
        .bind(notes)
        .bind(actor)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a customer. Historical appointments are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn soft_delete(
        &self,
        id: CustomerId,
        actor: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer
             SET deleted_at = now(), deleted_by = $2
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(actor)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
