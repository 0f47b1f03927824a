//! Service repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use slotwise_core::{CurrencyCode, PageParams, Price, ServiceId, TenantId, UserId};

use super::RepositoryError;
use crate::models::service::Service;

/// Internal row type for service queries.
#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: ServiceId,
    tenant_id: TenantId,
    name: String,
    description: Option<String>,
    duration_minutes: i32,
    price_amount: Decimal,
    price_currency: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Option<UserId>,
    updated_by: Option<UserId>,
}

impl TryFrom<ServiceRow> for Service {
    type Error = RepositoryError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let currency: CurrencyCode = row.price_currency.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            duration_minutes: row.duration_minutes,
            price: Price::new(row.price_amount, currency),
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
        })
    }
}

const SERVICE_COLUMNS: &str = "id, tenant_id, name, description, duration_minutes, \
     price_amount, price_currency, active, created_at, updated_at, created_by, updated_by";

fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("name") => "name",
        Some("duration") => "duration_minutes",
        Some("price") => "price_amount",
        _ => "created_at",
    }
}

/// Fields for creating a service.
#[derive(Debug)]
pub struct NewService<'a> {
    pub tenant_id: TenantId,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub duration_minutes: i32,
    pub price: Price,
    pub active: bool,
    pub actor: Option<UserId>,
}

/// Repository for service database operations.
pub struct ServiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRepository<'a> {
    /// Create a new service repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a service by id (not tenant-scoped; handlers recheck ownership).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for an unknown stored currency.
    pub async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM service WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List a tenant's services with paging, search, and sorting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        params: &PageParams,
    ) -> Result<(Vec<Service>, i64), RepositoryError> {
        let search = params.search.clone().unwrap_or_default();
        let order = sort_column(params.sort_by.as_deref());
        let direction = if params.sort_asc { "ASC" } else { "DESC" };

        let rows = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS}
             FROM service
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2 = '' OR name ILIKE '%' || $2 || '%'
                    OR description ILIKE '%' || $2 || '%')
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
             FROM service
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2 = '' OR name ILIKE '%' || $2 || '%'
                    OR description ILIKE '%' || $2 || '%')",
        )
        .bind(tenant_id)
        .bind(&search)
        .fetch_one(self.pool)
        .await?;

        let services = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((services, total))
    }

    /// Create a new service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, new: NewService<'_>) -> Result<Service, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            "INSERT INTO service
                 (id, tenant_id, name, description, duration_minutes,
                  price_amount, price_currency, active, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(ServiceId::generate())
        .bind(new.tenant_id)
        .bind(new.name)
        .bind(new.description)
        .bind(new.duration_minutes)
        .bind(new.price.amount)
        .bind(new.price.currency_code.code())
        .bind(new.active)
        .bind(new.actor)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Update a service's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the service does not exist.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: ServiceId,
        name: &str,
        description: Option<&str>,
        duration_minutes: i32,
        price: Price,
        active: bool,
        actor: Option<UserId>,
    ) -> Result<Service, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            "UPDATE service
             SET name = $2, description = $3, duration_minutes = $4,
                 price_amount = $5, price_currency = $6, active = $7,
                 updated_at = now(), updated_by = $8
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(duration_minutes)
        .bind(price.amount)
        .bind(price.currency_code.code())
        .bind(active)
        .bind(actor)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Soft-delete a service and detach it from all employees, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the service does not exist.
    pub async fn soft_delete_and_detach(
        &self,
        id: ServiceId,
        actor: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM employee_service WHERE service_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE service
             SET deleted_at = now(), deleted_by = $2
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(actor)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Whether future non-terminal appointments reference the service.
    /// Blocks deletion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_future_appointments(
        &self,
        id: ServiceId,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM appointment
                 WHERE service_id = $1 AND deleted_at IS NULL
                   AND start_time > $2
                   AND status NOT IN ('completed', 'canceled', 'no_show')
             )",
        )
        .bind(id)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}
