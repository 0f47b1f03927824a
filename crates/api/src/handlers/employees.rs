//! Employee commands and queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use slotwise_core::{EmployeeId, Page, PageParams, ServiceId, TenantId};

use super::{ensure_same_tenant, page_key_suffix};
use crate::db::employees::NewEmployee;
use crate::db::{EmployeeRepository, ServiceRepository};
use crate::error::AppError;
use crate::models::employee::Employee;
use crate::pipeline::{CachePolicy, Command, Handler, Invalidation, Query, Request, RequestContext};
use crate::state::AppState;

/// Employee as returned to clients, with assigned service ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDto {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub service_ids: Vec<ServiceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeDto {
    fn from_parts(employee: Employee, service_ids: Vec<ServiceId>) -> Self {
        Self {
            id: employee.id,
            first_name: employee.first_name,
            last_name: employee.last_name,
            email: employee.email,
            phone: employee.phone,
            title: employee.title,
            service_ids,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}

fn list_pattern(tenant_id: TenantId) -> String {
    format!("employees_list_t{tenant_id}")
}

// =============================================================================
// Queries
// =============================================================================

/// Paged employee listing.
#[derive(Debug, Validate)]
pub struct GetEmployeesList {
    pub tenant_id: TenantId,
    pub params: PageParams,
    pub refresh: bool,
}

impl Request for GetEmployeesList {
    const NAME: &'static str = "GetEmployeesList";
    type Output = Page<EmployeeDto>;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetEmployeesList {
    fn cache_policy(&self) -> Option<CachePolicy> {
        let key = format!(
            "{}{}",
            list_pattern(self.tenant_id),
            page_key_suffix(&self.params)
        );
        Some(CachePolicy::new(key).bypass_if(self.refresh))
    }
}

impl Handler<GetEmployeesList> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetEmployeesList,
    ) -> Result<Page<EmployeeDto>, AppError> {
        let repo = EmployeeRepository::new(self.pool());
        let (employees, total) = repo.list(request.tenant_id, &request.params).await?;

        let mut items = Vec::with_capacity(employees.len());
        for employee in employees {
            let service_ids = repo.service_ids(employee.id).await?;
            items.push(EmployeeDto::from_parts(employee, service_ids));
        }

        Ok(Page::new(items, &request.params, total))
    }
}

/// Single employee by id.
#[derive(Debug, Validate)]
pub struct GetEmployeeDetail {
    pub tenant_id: TenantId,
    pub id: EmployeeId,
}

impl Request for GetEmployeeDetail {
    const NAME: &'static str = "GetEmployeeDetail";
    type Output = EmployeeDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetEmployeeDetail {}

impl Handler<GetEmployeeDetail> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetEmployeeDetail,
    ) -> Result<EmployeeDto, AppError> {
        let repo = EmployeeRepository::new(self.pool());
        let employee = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", request.id)))?;

        ensure_same_tenant(employee.tenant_id, request.tenant_id)?;

        let service_ids = repo.service_ids(employee.id).await?;
        Ok(EmployeeDto::from_parts(employee, service_ids))
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Employee profile fields shared by create and update.
#[derive(Debug, Clone, Validate, Deserialize)]
pub struct EmployeeFields {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 32, message = "must be at most 32 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub title: Option<String>,
}

/// Create an employee.
#[derive(Debug, Validate)]
pub struct CreateEmployee {
    pub tenant_id: TenantId,
    #[validate(nested)]
    pub fields: EmployeeFields,
}

impl Request for CreateEmployee {
    const NAME: &'static str = "CreateEmployee";
    type Output = EmployeeDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for CreateEmployee {
    fn invalidation(&self) -> Invalidation {
        Invalidation::pattern(list_pattern(self.tenant_id))
    }
}

impl Handler<CreateEmployee> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: CreateEmployee,
    ) -> Result<EmployeeDto, AppError> {
        let repo = EmployeeRepository::new(self.pool());
        let employee = repo
            .insert(NewEmployee {
                tenant_id: request.tenant_id,
                first_name: &request.fields.first_name,
                last_name: &request.fields.last_name,
                email: request.fields.email.as_deref(),
                phone: request.fields.phone.as_deref(),
                title: request.fields.title.as_deref(),
                actor: ctx.actor(),
            })
            .await?;

        Ok(EmployeeDto::from_parts(employee, Vec::new()))
    }
}

/// Update an employee's profile.
#[derive(Debug, Validate)]
pub struct UpdateEmployee {
    pub tenant_id: TenantId,
    pub id: EmployeeId,
    #[validate(nested)]
    pub fields: EmployeeFields,
}

impl Request for UpdateEmployee {
    const NAME: &'static str = "UpdateEmployee";
    type Output = EmployeeDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for UpdateEmployee {
    fn invalidation(&self) -> Invalidation {
        Invalidation::pattern(list_pattern(self.tenant_id))
    }
}

impl Handler<UpdateEmployee> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: UpdateEmployee,
    ) -> Result<EmployeeDto, AppError> {
        let repo = EmployeeRepository::new(self.pool());
        let existing = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", request.id)))?;

        ensure_same_tenant(existing.tenant_id, request.tenant_id)?;

        let updated = repo
            .update(
                request.id,
                &request.fields.first_name,
                &request.fields.last_name,
                request.fields.email.as_deref(),
                request.fields.phone.as_deref(),
                request.fields.title.as_deref(),
                ctx.actor(),
            )
            .await?;

        let service_ids = repo.service_ids(request.id).await?;
        Ok(EmployeeDto::from_parts(updated, service_ids))
    }
}

/// Soft-delete an employee. Rejected while they still have upcoming
/// appointments.
#[derive(Debug, Validate)]
pub struct DeleteEmployee {
    pub tenant_id: TenantId,
    pub id: EmployeeId,
}

impl Request for DeleteEmployee {
    const NAME: &'static str = "DeleteEmployee";
    type Output = ();

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for DeleteEmployee {
    fn invalidation(&self) -> Invalidation {
        Invalidation::pattern(list_pattern(self.tenant_id))
    }
}

impl Handler<DeleteEmployee> for AppState {
    async fn handle(&self, ctx: &RequestContext, request: DeleteEmployee) -> Result<(), AppError> {
        let repo = EmployeeRepository::new(self.pool());
        let existing = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", request.id)))?;

        ensure_same_tenant(existing.tenant_id, request.tenant_id)?;

        if repo.has_future_appointments(request.id, Utc::now()).await? {
            return Err(AppError::BusinessRule(
                "Employee has upcoming appointments and cannot be deleted".to_string(),
            ));
        }

        repo.soft_delete(request.id, ctx.actor()).await?;
        Ok(())
    }
}

/// Replace the employee's assigned service set.
#[derive(Debug, Validate)]
pub struct AssignServices {
    pub tenant_id: TenantId,
    pub employee_id: EmployeeId,
    #[validate(length(max = 100, message = "too many services"))]
    pub service_ids: Vec<ServiceId>,
}

impl Request for AssignServices {
    const NAME: &'static str = "AssignServices";
    type Output = EmployeeDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for AssignServices {
    fn invalidation(&self) -> Invalidation {
        Invalidation::patterns([
            list_pattern(self.tenant_id),
            format!("slots_t{}", self.tenant_id),
        ])
    }
}

impl Handler<AssignServices> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: AssignServices,
    ) -> Result<EmployeeDto, AppError> {
        let repo = EmployeeRepository::new(self.pool());
        let employee = repo
            .find_by_id(request.employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", request.employee_id)))?;

        ensure_same_tenant(employee.tenant_id, request.tenant_id)?;

        // Every assigned service must exist under the same tenant.
        let services = ServiceRepository::new(self.pool());
        for service_id in &request.service_ids {
            let service = services
                .find_by_id(*service_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("service {service_id}")))?;
            ensure_same_tenant(service.tenant_id, request.tenant_id)?;
        }

        repo.replace_services(request.employee_id, &request.service_ids)
            .await?;

        let service_ids = repo.service_ids(request.employee_id).await?;
        Ok(EmployeeDto::from_parts(employee, service_ids))
    }
}
