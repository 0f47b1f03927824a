//! Tenant repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use slotwise_core::{Email, TenantId, UserId, UserRole};

use super::{RepositoryError, map_unique_violation};
use crate::models::settings::TenantSettings;
use crate::models::tenant::Tenant;
use crate::models::user::User;

/// Internal row type for tenant queries.
#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: TenantId,
    name: String,
    slug: String,
    contact_email: Email,
    timezone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Option<UserId>,
    updated_by: Option<UserId>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            contact_email: row.contact_email,
            timezone: row.timezone,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
        }
    }
}

const TENANT_COLUMNS: &str = "id, name, slug, contact_email, timezone, \
     created_at, updated_at, created_by, updated_by";

/// Fields for registering a tenant together with its owner account.
#[derive(Debug)]
pub struct NewTenantRegistration<'a> {
    pub tenant_name: &'a str,
    pub slug: &'a str,
    pub contact_email: &'a Email,
    pub timezone: &'a str,
    pub owner_email: &'a Email,
    pub owner_password_hash: &'a str,
}

/// Repository for tenant database operations.
pub struct TenantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TenantRepository<'a> {
    /// Create a new tenant repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a tenant: the tenant row, default settings, and the owner
    /// account are created in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or owner email is
    /// already taken, `RepositoryError::Database` for other failures.
    pub async fn register(
        &self,
        new: NewTenantRegistration<'_>,
    ) -> Result<(Tenant, User), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let tenant_id = TenantId::generate();
        let tenant_row = sqlx::query_as::<_, TenantRow>(&format!(
            "INSERT INTO tenant (id, name, slug, contact_email, timezone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TENANT_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(new.tenant_name)
        .bind(new.slug)
        .bind(new.contact_email)
        .bind(new.timezone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "slug already taken"))?;

        let settings = TenantSettings::defaults_for(tenant_id);
        sqlx::query(
            "INSERT INTO tenant_settings
                 (tenant_id, slot_granularity_minutes, min_notice_minutes,
                  booking_window_days, cancellation_window_hours, business_hours)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(tenant_id)
        .bind(settings.slot_granularity_minutes)
        .bind(settings.min_notice_minutes)
        .bind(settings.booking_window_days)
        .bind(settings.cancellation_window_hours)
        .bind(Json(&settings.business_hours))
        .execute(&mut *tx)
        .await?;

        let owner_id = UserId::generate();
        let owner_row = sqlx::query_as::<_, super::users::UserRow>(
            "INSERT INTO app_user (id, tenant_id, email, password_hash, role, created_by)
             VALUES ($1, $2, $3, $4, $5, $1)
             RETURNING id, tenant_id, email, role, created_at, updated_at",
        )
        .bind(owner_id)
        .bind(tenant_id)
        .bind(new.owner_email)
        .bind(new.owner_password_hash)
        .bind(UserRole::Owner)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "email already registered"))?;

        tx.commit().await?;

        Ok((tenant_row.into(), owner_row.into()))
    }

    /// Get a tenant by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenant WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Update a tenant's profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tenant does not exist.
    pub async fn update(
        &self,
        id: TenantId,
        name: &str,
        contact_email: &Email,
        timezone: &str,
        actor: Option<UserId>,
    ) -> Result<Tenant, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "UPDATE tenant
             SET name = $2, contact_email = $3, timezone = $4,
                 updated_at = now(), updated_by = $5
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {TENANT_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(contact_email)
        .bind(timezone)
        .bind(actor)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }
}
