//! Employee repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use slotwise_core::{EmployeeId, PageParams, ServiceId, TenantId, UserId};

use super::RepositoryError;
use crate::models::employee::Employee;

/// Internal row type for employee queries.
#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: EmployeeId,
    tenant_id: TenantId,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    title: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Option<UserId>,
    updated_by: Option<UserId>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
        }
    }
}

const EMPLOYEE_COLUMNS: &str = "id, tenant_id, first_name, last_name, email, phone, title, \
     created_at, updated_at, created_by, updated_by";

fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("first_name") => "first_name",
        Some("last_name") => "last_name",
        Some("title") => "title",
        _ => "created_at",
    }
}

/// Fields for creating an employee.
#[derive(Debug)]
pub struct NewEmployee<'a> {
    pub tenant_id: TenantId,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub title: Option<&'a str>,
    pub actor: Option<UserId>,
}

/// Repository for employee database operations.
pub struct EmployeeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EmployeeRepository<'a> {
    /// Create a new employee repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an employee by id (not tenant-scoped; handlers recheck ownership).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a tenant's employees with paging, search, and sorting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        params: &PageParams,
    ) -> Result<(Vec<Employee>, i64), RepositoryError> {
        let search = params.search.clone().unwrap_or_default();
        let order = sort_column(params.sort_by.as_deref());
        let direction = if params.sort_asc { "ASC" } else { "DESC" };

        let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS}
             FROM employee
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2 = '' OR first_name ILIKE '%' || $2 || '%'
                    OR last_name ILIKE '%' || $2 || '%'
                    OR title ILIKE '%' || $2 || '%')
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
             FROM employee
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2 = '' OR first_name ILIKE '%' || $2 || '%'
                    OR last_name ILIKE '%' || $2 || '%'
                    OR title ILIKE '%' || $2 || '%')",
        )
        .bind(tenant_id)
        .bind(&search)
        .fetch_one(self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Create a new employee.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, new: NewEmployee<'_>) -> Result<Employee, RepositoryError> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "INSERT INTO employee
                 (id, tenant_id, first_name, last_name, email, phone, title, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {EMPLOYEE_COLUMNS}"
        ))
        .bind(EmployeeId::generate())
        .bind(new.tenant_id)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.title)
        .bind(new.actor)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update an employee's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the employee does not exist.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: EmployeeId,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        title: Option<&str>,
        actor: Option<UserId>,
    ) -> Result<Employee, RepositoryError> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "UPDATE employee
             SET first_name = $2, last_name = $3, email = $4, phone = $5, title = $6,
                 updated_at = now(), updated_by = $7
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {EMPLOYEE_COLUMNS}"
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(phone)
        .bind(title)
        .bind(actor)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete an employee.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the employee does not exist.
    pub async fn soft_delete(
        &self,
        id: EmployeeId,
        actor: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE employee
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

    /// Services this employee is assigned to perform.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn service_ids(&self, id: EmployeeId) -> Result<Vec<ServiceId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, ServiceId>(
            "SELECT service_id FROM employee_service WHERE employee_id = $1",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Replace the employee's assigned service set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn replace_services(
        &self,
        id: EmployeeId,
        service_ids: &[ServiceId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM employee_service WHERE employee_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for service_id in service_ids {
            sqlx::query("INSERT INTO employee_service (employee_id, service_id) VALUES ($1, $2)")
                .bind(id)
                .bind(service_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Whether the employee is assigned to perform the given service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn offers_service(
        &self,
        id: EmployeeId,
        service_id: ServiceId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM employee_service WHERE employee_id = $1 AND service_id = $2
             )",
        )
        .bind(id)
        .bind(service_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Whether the employee has upcoming appointments that are not yet
    /// terminal. Blocks deletion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_future_appointments(
        &self,
        id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM appointment
                 WHERE employee_id = $1 AND deleted_at IS NULL
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
