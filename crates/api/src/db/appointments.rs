//! Appointment repository.
//!
//! Booking writes serialize per employee: the availability check and the
//! insert/update run in one transaction holding a per-employee advisory
//! lock, so two concurrent bookings for the same slot cannot both pass the
//! check.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use slotwise_core::{
    AppointmentId, AppointmentStatus, CustomerId, EmployeeId, PageParams, ServiceId, TenantId,
    UserId,
};

use super::RepositoryError;
use crate::models::appointment::Appointment;

/// Internal row type for appointment queries.
#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: AppointmentId,
    tenant_id: TenantId,
    customer_id: CustomerId,
    employee_id: EmployeeId,
    service_id: ServiceId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: AppointmentStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Option<UserId>,
    updated_by: Option<UserId>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            customer_id: row.customer_id,
            employee_id: row.employee_id,
            service_id: row.service_id,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
        }
    }
}

const APPOINTMENT_COLUMNS: &str = "id, tenant_id, customer_id, employee_id, service_id, \
     start_time, end_time, status, notes, created_at, updated_at, created_by, updated_by";

/// Optional filters for appointment listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub employee_id: Option<EmployeeId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Fields for booking an appointment.
#[derive(Debug)]
pub struct NewAppointment<'a> {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub employee_id: EmployeeId,
    pub service_id: ServiceId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<&'a str>,
    pub actor: Option<UserId>,
}

/// Repository for appointment database operations.
pub struct AppointmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppointmentRepository<'a> {
    /// Create a new appointment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an appointment by id (not tenant-scoped; handlers recheck
    /// ownership).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(
        &self,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointment WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a tenant's appointments with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        filter: &AppointmentFilter,
        params: &PageParams,
    ) -> Result<(Vec<Appointment>, i64), RepositoryError> {
        const WHERE_CLAUSE: &str = "tenant_id = $1 AND deleted_at IS NULL
               AND ($2::uuid IS NULL OR employee_id = $2)
               AND ($3::uuid IS NULL OR customer_id = $3)
               AND ($4::appointment_status IS NULL OR status = $4)
               AND ($5::timestamptz IS NULL OR start_time >= $5)
               AND ($6::timestamptz IS NULL OR start_time < $6)";

        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS}
             FROM appointment
             WHERE {WHERE_CLAUSE}
             ORDER BY start_time DESC
             LIMIT $7 OFFSET $8"
        ))
        .bind(tenant_id)
        .bind(filter.employee_id)
        .bind(filter.customer_id)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM appointment WHERE {WHERE_CLAUSE}"
        ))
        .bind(tenant_id)
        .bind(filter.employee_id)
        .bind(filter.customer_id)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// All of an employee's non-terminal appointments overlapping a window.
    /// Used by slot computation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_employee_between(
        &self,
        employee_id: EmployeeId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS}
             FROM appointment
             WHERE employee_id = $1 AND deleted_at IS NULL
               AND status NOT IN ('canceled', 'no_show')
               AND start_time < $3 AND end_time > $2
             ORDER BY start_time ASC"
        ))
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Book an appointment if the slot is free.
    ///
    /// Returns `None` when the slot overlaps an existing non-terminal
    /// appointment for the employee. Check and insert run under a
    /// per-employee advisory lock, so concurrent bookings serialize.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn create_if_available(
        &self,
        new: NewAppointment<'_>,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_employee(&mut tx, new.employee_id).await?;

        let available =
            slot_is_free(&mut tx, new.employee_id, new.start_time, new.end_time, None).await?;
        if !available {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "INSERT INTO appointment
                 (id, tenant_id, customer_id, employee_id, service_id,
                  start_time, end_time, notes, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(AppointmentId::generate())
        .bind(new.tenant_id)
        .bind(new.customer_id)
        .bind(new.employee_id)
        .bind(new.service_id)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.notes)
        .bind(new.actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    /// Move an appointment to a new slot if it is free.
    ///
    /// The appointment itself is excluded from the overlap check. Returns
    /// `None` when the target slot is taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the appointment vanished
    /// between load and update.
    pub async fn reschedule_if_available(
        &self,
        id: AppointmentId,
        employee_id: EmployeeId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        actor: Option<UserId>,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_employee(&mut tx, employee_id).await?;

        let available = slot_is_free(&mut tx, employee_id, start_time, end_time, Some(id)).await?;
        if !available {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "UPDATE appointment
             SET start_time = $2, end_time = $3, updated_at = now(), updated_by = $4
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(start_time)
        .bind(end_time)
        .bind(actor)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    /// Set an appointment's status. Transition legality is the handler's
    /// responsibility; this is a plain persisted write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the appointment does not exist.
    pub async fn update_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
        actor: Option<UserId>,
    ) -> Result<Appointment, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "UPDATE appointment
             SET status = $2, updated_at = now(), updated_by = $3
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(actor)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete an appointment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the appointment does not exist.
    pub async fn soft_delete(
        &self,
        id: AppointmentId,
        actor: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE appointment
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

/// Take the per-employee advisory lock for the current transaction.
async fn lock_employee(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: EmployeeId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
        .bind(employee_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Whether `[start, end)` overlaps no non-terminal appointment for the
/// employee. Canceled and no-show appointments free their slot.
async fn slot_is_free(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: EmployeeId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    exclude: Option<AppointmentId>,
) -> Result<bool, RepositoryError> {
    let free: bool = sqlx::query_scalar(
        "SELECT NOT EXISTS (
             SELECT 1 FROM appointment
             WHERE employee_id = $1 AND deleted_at IS NULL
               AND status NOT IN ('canceled', 'no_show')
               AND start_time < $3 AND end_time > $2
               AND ($4::uuid IS NULL OR id <> $4)
         )",
    )
    .bind(employee_id)
    .bind(start_time)
    .bind(end_time)
    .bind(exclude)
    .fetch_one(&mut **tx)
    .await?;

    Ok(free)
}
