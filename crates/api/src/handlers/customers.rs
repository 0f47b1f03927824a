//! Customer commands and queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use slotwise_core::{CustomerId, Page, PageParams, TenantId};

use super::{ensure_same_tenant, page_key_suffix};
use crate::db::CustomerRepository;
use crate::db::customers::NewCustomer;
use crate::error::AppError;
use crate::models::customer::Customer;
use crate::pipeline::{CachePolicy, Command, Handler, Invalidation, Query, Request, RequestContext};
use crate::state::AppState;

/// Customer as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDto {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: customer.phone,
            notes: customer.notes,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

fn list_pattern(tenant_id: TenantId) -> String {
    format!("customers_list_t{tenant_id}")
}

// =============================================================================
// Queries
// =============================================================================

/// Paged customer listing.
#[derive(Debug, Validate)]
pub struct GetCustomersList {
    pub tenant_id: TenantId,
    pub params: PageParams,
    /// Skip the cache read (entry still refreshed).
    pub refresh: bool,
}

impl Request for GetCustomersList {
    const NAME: &'static str = "GetCustomersList";
    type Output = Page<CustomerDto>;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetCustomersList {
    fn cache_policy(&self) -> Option<CachePolicy> {
        let key = format!(
            "{}{}",
            list_pattern(self.tenant_id),
            page_key_suffix(&self.params)
        );
        Some(CachePolicy::new(key).bypass_if(self.refresh))
    }
}

impl Handler<GetCustomersList> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetCustomersList,
    ) -> Result<Page<CustomerDto>, AppError> {
        let repo = CustomerRepository::new(self.pool());
        let (customers, total) = repo.list(request.tenant_id, &request.params).await?;

        let items = customers.into_iter().map(Into::into).collect();
        Ok(Page::new(items, &request.params, total))
    }
}

/// Single customer by id.
#[derive(Debug, Validate)]
pub struct GetCustomerDetail {
    pub tenant_id: TenantId,
    pub id: CustomerId,
}

impl Request for GetCustomerDetail {
    const NAME: &'static str = "GetCustomerDetail";
    type Output = CustomerDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetCustomerDetail {}

impl Handler<GetCustomerDetail> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetCustomerDetail,
    ) -> Result<CustomerDto, AppError> {
        let repo = CustomerRepository::new(self.pool());
        let customer = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer {}", request.id)))?;

        ensure_same_tenant(customer.tenant_id, request.tenant_id)?;

        Ok(customer.into())
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Customer profile fields shared by create and update.
#[derive(Debug, Clone, Validate, Deserialize)]
pub struct CustomerFields {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 32, message = "must be at most 32 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Create a customer.
#[derive(Debug, Validate)]
pub struct CreateCustomer {
    pub tenant_id: TenantId,
    #[validate(nested)]
    pub fields: CustomerFields,
}

impl Request for CreateCustomer {
    const NAME: &'static str = "CreateCustomer";
    type Output = CustomerDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for CreateCustomer {
    fn invalidation(&self) -> Invalidation {
        Invalidation::pattern(list_pattern(self.tenant_id))
    }
}

impl Handler<CreateCustomer> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: CreateCustomer,
    ) -> Result<CustomerDto, AppError> {
        let repo = CustomerRepository::new(self.pool());
        let customer = repo
            .insert(NewCustomer {
                tenant_id: request.tenant_id,
                first_name: &request.fields.first_name,
                last_name: &request.fields.last_name,
                email: request.fields.email.as_deref(),
                phone: request.fields.phone.as_deref(),
                notes: request.fields.notes.as_deref(),
                actor: ctx.actor(),
            })
            .await?;

        Ok(customer.into())
    }
}

/// Update a customer's profile.
#[derive(Debug, Validate)]
pub struct UpdateCustomer {
    pub tenant_id: TenantId,
    pub id: CustomerId,
    #[validate(nested)]
    pub fields: CustomerFields,
}

impl Request for UpdateCustomer {
    const NAME: &'static str = "UpdateCustomer";
    type Output = CustomerDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for UpdateCustomer {
    fn invalidation(&self) -> Invalidation {
        Invalidation::pattern(list_pattern(self.tenant_id))
    }
}

impl Handler<UpdateCustomer> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: UpdateCustomer,
    ) -> Result<CustomerDto, AppError> {
        let repo = CustomerRepository::new(self.pool());
        let existing = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer {}", request.id)))?;

        ensure_same_tenant(existing.tenant_id, request.tenant_id)?;

        let updated = repo
            .update(
                request.id,
                &request.fields.first_name,
                &request.fields.last_name,
                request.fields.email.as_deref(),
                request.fields.phone.as_deref(),
                request.fields.notes.as_deref(),
                ctx.actor(),
            )
            .await?;

        Ok(updated.into())
    }
}

/// Soft-delete a customer. Their historical appointments stay.
#[derive(Debug, Validate)]
pub struct DeleteCustomer {
    pub tenant_id: TenantId,
    pub id: CustomerId,
}

impl Request for DeleteCustomer {
    const NAME: &'static str = "DeleteCustomer";
    type Output = ();

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for DeleteCustomer {
    fn invalidation(&self) -> Invalidation {
        Invalidation::pattern(list_pattern(self.tenant_id))
    }
}

impl Handler<DeleteCustomer> for AppState {
    async fn handle(&self, ctx: &RequestContext, request: DeleteCustomer) -> Result<(), AppError> {
        let repo = CustomerRepository::new(self.pool());
        let existing = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer {}", request.id)))?;

        ensure_same_tenant(existing.tenant_id, request.tenant_id)?;

        repo.soft_delete(request.id, ctx.actor()).await?;
        Ok(())
    }
}
