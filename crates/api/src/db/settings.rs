//! Tenant settings repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use slotwise_core::{TenantId, UserId};

use super::RepositoryError;
use crate::models::settings::{BusinessHours, TenantSettings};

/// Internal row type for settings queries.
#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    tenant_id: TenantId,
    slot_granularity_minutes: i32,
    min_notice_minutes: i32,
    booking_window_days: i32,
    cancellation_window_hours: i32,
    business_hours: Json<BusinessHours>,
    updated_at: DateTime<Utc>,
    updated_by: Option<UserId>,
}

impl From<SettingsRow> for TenantSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            tenant_id: row.tenant_id,
            slot_granularity_minutes: row.slot_granularity_minutes,
            min_notice_minutes: row.min_notice_minutes,
            booking_window_days: row.booking_window_days,
            cancellation_window_hours: row.cancellation_window_hours,
            business_hours: row.business_hours.0,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        }
    }
}

const SETTINGS_COLUMNS: &str = "tenant_id, slot_granularity_minutes, min_notice_minutes, \
     booking_window_days, cancellation_window_hours, business_hours, updated_at, updated_by";

/// Repository for tenant settings.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a tenant's settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, tenant_id: TenantId) -> Result<Option<TenantSettings>, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM tenant_settings WHERE tenant_id = $1"
        ))
        .bind(tenant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Replace a tenant's settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tenant has no settings row.
    pub async fn update(
        &self,
        settings: &TenantSettings,
        actor: Option<UserId>,
    ) -> Result<TenantSettings, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            "UPDATE tenant_settings
             SET slot_granularity_minutes = $2, min_notice_minutes = $3,
                 booking_window_days = $4, cancellation_window_hours = $5,
                 business_hours = $6, updated_at = now(), updated_by = $7
             WHERE tenant_id = $1
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(settings.tenant_id)
        .bind(settings.slot_granularity_minutes)
        .bind(settings.min_notice_minutes)
        .bind(settings.booking_window_days)
        .bind(settings.cancellation_window_hours)
        .bind(Json(&settings.business_hours))
        .bind(actor)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }
}
