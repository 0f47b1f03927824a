//! Tenant profile commands and queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use slotwise_core::{Email, TenantId, UserRole};

use crate::db::TenantRepository;
use crate::error::AppError;
use crate::models::tenant::Tenant;
use crate::pipeline::{Command, Handler, Query, Request, RequestContext};
use crate::state::AppState;

/// Tenant as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantDto {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl From<Tenant> for TenantDto {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name,
            slug: tenant.slug,
            contact_email: tenant.contact_email.into_inner(),
            timezone: tenant.timezone,
            created_at: tenant.created_at,
        }
    }
}

/// The caller's own tenant.
#[derive(Debug, Validate)]
pub struct GetCurrentTenant {
    pub tenant_id: TenantId,
}

impl Request for GetCurrentTenant {
    const NAME: &'static str = "GetCurrentTenant";
    type Output = TenantDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetCurrentTenant {}

impl Handler<GetCurrentTenant> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetCurrentTenant,
    ) -> Result<TenantDto, AppError> {
        let tenant = TenantRepository::new(self.pool())
            .find_by_id(request.tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tenant {}", request.tenant_id)))?;

        Ok(tenant.into())
    }
}

/// Update the caller's tenant profile. Owner only.
#[derive(Debug, Validate)]
pub struct UpdateTenant {
    pub tenant_id: TenantId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub contact_email: String,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub timezone: String,
}

impl Request for UpdateTenant {
    const NAME: &'static str = "UpdateTenant";
    type Output = TenantDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for UpdateTenant {}

impl Handler<UpdateTenant> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: UpdateTenant,
    ) -> Result<TenantDto, AppError> {
        ctx.require_role(UserRole::Owner)?;

        let email = Email::parse(&request.contact_email)
            .map_err(|e| AppError::Validation(vec![format!("contact_email: {e}")]))?;

        let tenant = TenantRepository::new(self.pool())
            .update(
                request.tenant_id,
                &request.name,
                &email,
                &request.timezone,
                ctx.actor(),
            )
            .await?;

        Ok(tenant.into())
    }
}
