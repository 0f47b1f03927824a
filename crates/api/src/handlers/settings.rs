//! Tenant settings commands and queries.

use serde::{Deserialize, Serialize};
use validator::Validate;

use slotwise_core::{TenantId, UserRole};

use crate::db::SettingsRepository;
use crate::error::AppError;
use crate::models::settings::{BusinessHours, TenantSettings};
use crate::pipeline::{CachePolicy, Command, Handler, Invalidation, Query, Request, RequestContext};
use crate::state::AppState;

/// Settings as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDto {
    pub slot_granularity_minutes: i32,
    pub min_notice_minutes: i32,
    pub booking_window_days: i32,
    pub cancellation_window_hours: i32,
    pub business_hours: BusinessHours,
}

impl From<TenantSettings> for SettingsDto {
    fn from(settings: TenantSettings) -> Self {
        Self {
            slot_granularity_minutes: settings.slot_granularity_minutes,
            min_notice_minutes: settings.min_notice_minutes,
            booking_window_days: settings.booking_window_days,
            cancellation_window_hours: settings.cancellation_window_hours,
            business_hours: settings.business_hours,
        }
    }
}

fn settings_key(tenant_id: TenantId) -> String {
    format!("settings_t{tenant_id}")
}

/// The caller's tenant settings.
#[derive(Debug, Validate)]
pub struct GetSettings {
    pub tenant_id: TenantId,
}

impl Request for GetSettings {
    const NAME: &'static str = "GetSettings";
    type Output = SettingsDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetSettings {
    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(settings_key(self.tenant_id)))
    }
}

impl Handler<GetSettings> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetSettings,
    ) -> Result<SettingsDto, AppError> {
        let settings = SettingsRepository::new(self.pool())
            .get(request.tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("tenant settings".to_string()))?;

        Ok(settings.into())
    }
}

/// Replace the caller's tenant settings. Owner only.
#[derive(Debug, Validate)]
pub struct UpdateSettings {
    pub tenant_id: TenantId,
    #[validate(range(min = 5, max = 120, message = "must be between 5 and 120 minutes"))]
    pub slot_granularity_minutes: i32,
    #[validate(range(min = 0, max = 10_080, message = "must be between 0 minutes and 7 days"))]
    pub min_notice_minutes: i32,
    #[validate(range(min = 1, max = 365, message = "must be between 1 and 365 days"))]
    pub booking_window_days: i32,
    #[validate(range(min = 0, max = 720, message = "must be between 0 and 720 hours"))]
    pub cancellation_window_hours: i32,
    pub business_hours: BusinessHours,
}

impl Request for UpdateSettings {
    const NAME: &'static str = "UpdateSettings";
    type Output = SettingsDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for UpdateSettings {
    fn invalidation(&self) -> Invalidation {
        // The settings entry is keyed exactly; availability is pattern-swept.
        Invalidation::pattern(format!("slots_t{}", self.tenant_id))
            .and_key(settings_key(self.tenant_id))
    }
}

impl Handler<UpdateSettings> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: UpdateSettings,
    ) -> Result<SettingsDto, AppError> {
        ctx.require_role(UserRole::Owner)?;

        let repo = SettingsRepository::new(self.pool());
        let mut settings = repo
            .get(request.tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("tenant settings".to_string()))?;

        settings.slot_granularity_minutes = request.slot_granularity_minutes;
        settings.min_notice_minutes = request.min_notice_minutes;
        settings.booking_window_days = request.booking_window_days;
        settings.cancellation_window_hours = request.cancellation_window_hours;
        settings.business_hours = request.business_hours;

        let updated = repo.update(&settings, ctx.actor()).await?;
        Ok(updated.into())
    }
}
