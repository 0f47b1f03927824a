//! Service commands and queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use slotwise_core::{CurrencyCode, Page, PageParams, Price, ServiceId, TenantId};

use super::{ensure_same_tenant, page_key_suffix};
use crate::db::ServiceRepository;
use crate::db::services::NewService;
use crate::error::AppError;
use crate::models::service::Service;
use crate::pipeline::{CachePolicy, Command, Handler, Invalidation, Query, Request, RequestContext};
use crate::state::AppState;

/// Service as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDto {
    pub id: ServiceId,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price_amount: Decimal,
    pub price_currency: CurrencyCode,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Service> for ServiceDto {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            duration_minutes: service.duration_minutes,
            price_amount: service.price.amount,
            price_currency: service.price.currency_code,
            active: service.active,
            created_at: service.created_at,
            updated_at: service.updated_at,
        }
    }
}

fn list_pattern(tenant_id: TenantId) -> String {
    format!("services_list_t{tenant_id}")
}

// =============================================================================
// Queries
// =============================================================================

/// Paged service listing.
#[derive(Debug, Validate)]
pub struct GetServicesList {
    pub tenant_id: TenantId,
    pub params: PageParams,
    pub refresh: bool,
}

impl Request for GetServicesList {
    const NAME: &'static str = "GetServicesList";
    type Output = Page<ServiceDto>;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetServicesList {
    fn cache_policy(&self) -> Option<CachePolicy> {
        let key = format!(
            "{}{}",
            list_pattern(self.tenant_id),
            page_key_suffix(&self.params)
        );
        Some(CachePolicy::new(key).bypass_if(self.refresh))
    }
}

impl Handler<GetServicesList> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetServicesList,
    ) -> Result<Page<ServiceDto>, AppError> {
        let repo = ServiceRepository::new(self.pool());
        let (services, total) = repo.list(request.tenant_id, &request.params).await?;

        let items = services.into_iter().map(Into::into).collect();
        Ok(Page::new(items, &request.params, total))
    }
}

/// Single service by id.
#[derive(Debug, Validate)]
pub struct GetServiceDetail {
    pub tenant_id: TenantId,
    pub id: ServiceId,
}

impl Request for GetServiceDetail {
    const NAME: &'static str = "GetServiceDetail";
    type Output = ServiceDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetServiceDetail {}

impl Handler<GetServiceDetail> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetServiceDetail,
    ) -> Result<ServiceDto, AppError> {
        let repo = ServiceRepository::new(self.pool());
        let service = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("service {}", request.id)))?;

        ensure_same_tenant(service.tenant_id, request.tenant_id)?;

        Ok(service.into())
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Service fields shared by create and update.
#[derive(Debug, Clone, Validate, Deserialize)]
pub struct ServiceFields {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 5, max = 480, message = "must be between 5 and 480 minutes"))]
    pub duration_minutes: i32,
    pub price_amount: Decimal,
    pub price_currency: CurrencyCode,
    pub active: bool,
}

impl ServiceFields {
    fn price(&self) -> Result<Price, AppError> {
        if self.price_amount < Decimal::ZERO {
            return Err(AppError::Validation(vec![
                "price_amount: must not be negative".to_string(),
            ]));
        }
        Ok(Price::new(self.price_amount, self.price_currency))
    }
}

/// Create a service.
#[derive(Debug, Validate)]
pub struct CreateService {
    pub tenant_id: TenantId,
    #[validate(nested)]
    pub fields: ServiceFields,
}

impl Request for CreateService {
    const NAME: &'static str = "CreateService";
    type Output = ServiceDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for CreateService {
    fn invalidation(&self) -> Invalidation {
        Invalidation::pattern(list_pattern(self.tenant_id))
    }
}

impl Handler<CreateService> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: CreateService,
    ) -> Result<ServiceDto, AppError> {
        let price = request.fields.price()?;

        let repo = ServiceRepository::new(self.pool());
        let service = repo
            .insert(NewService {
                tenant_id: request.tenant_id,
                name: &request.fields.name,
                description: request.fields.description.as_deref(),
                duration_minutes: request.fields.duration_minutes,
                price,
                active: request.fields.active,
                actor: ctx.actor(),
            })
            .await?;

        Ok(service.into())
    }
}

/// Update a service.
#[derive(Debug, Validate)]
pub struct UpdateService {
    pub tenant_id: TenantId,
    pub id: ServiceId,
    #[validate(nested)]
    pub fields: ServiceFields,
}

impl Request for UpdateService {
    const NAME: &'static str = "UpdateService";
    type Output = ServiceDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for UpdateService {
    fn invalidation(&self) -> Invalidation {
        // Duration changes shift computed availability as well.
        Invalidation::patterns([
            list_pattern(self.tenant_id),
            format!("slots_t{}", self.tenant_id),
        ])
    }
}

impl Handler<UpdateService> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: UpdateService,
    ) -> Result<ServiceDto, AppError> {
        let price = request.fields.price()?;

        let repo = ServiceRepository::new(self.pool());
        let existing = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("service {}", request.id)))?;

        ensure_same_tenant(existing.tenant_id, request.tenant_id)?;

        let updated = repo
            .update(
                request.id,
                &request.fields.name,
                request.fields.description.as_deref(),
                request.fields.duration_minutes,
                price,
                request.fields.active,
                ctx.actor(),
            )
            .await?;

        Ok(updated.into())
    }
}

/// Soft-delete a service, detaching it from employees first. Rejected while
/// future appointments still reference it.
#[derive(Debug, Validate)]
pub struct DeleteService {
    pub tenant_id: TenantId,
    pub id: ServiceId,
}

impl Request for DeleteService {
    const NAME: &'static str = "DeleteService";
    type Output = ();

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for DeleteService {
    fn invalidation(&self) -> Invalidation {
        Invalidation::patterns([
            list_pattern(self.tenant_id),
            format!("slots_t{}", self.tenant_id),
        ])
    }
}

impl Handler<DeleteService> for AppState {
    async fn handle(&self, ctx: &RequestContext, request: DeleteService) -> Result<(), AppError> {
        let repo = ServiceRepository::new(self.pool());
        let existing = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("service {}", request.id)))?;

        ensure_same_tenant(existing.tenant_id, request.tenant_id)?;

        if repo.has_future_appointments(request.id, Utc::now()).await? {
            return Err(AppError::BusinessRule(
                "Service has upcoming appointments and cannot be deleted".to_string(),
            ));
        }

        repo.soft_delete_and_detach(request.id, ctx.actor()).await?;
        Ok(())
    }
}
