//! Employee routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde::Deserialize;

use slotwise_core::{EmployeeId, Page, ServiceId};

use super::ListQuery;
use crate::error::Result;
use crate::handlers::employees::{
    AssignServices, CreateEmployee, DeleteEmployee, EmployeeDto, EmployeeFields,
    GetEmployeeDetail, GetEmployeesList, UpdateEmployee,
};
use crate::middleware::CurrentUser;
use crate::pipeline::{dispatch_command, dispatch_query};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Create the employee routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(update).delete(remove))
        .route("/{id}/services", put(assign_services))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<EmployeeDto>>>> {
    let request = GetEmployeesList {
        tenant_id: ctx.require_tenant()?,
        params: query.page_params(),
        refresh: query.refresh(),
    };

    let page = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn detail(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<EmployeeId>,
) -> Result<Json<ApiResponse<EmployeeDto>>> {
    let request = GetEmployeeDetail {
        tenant_id: ctx.require_tenant()?,
        id,
    };

    let employee = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(employee)))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(fields): Json<EmployeeFields>,
) -> Result<Json<ApiResponse<EmployeeDto>>> {
    let request = CreateEmployee {
        tenant_id: ctx.require_tenant()?,
        fields,
    };

    let employee = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(employee)))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<EmployeeId>,
    Json(fields): Json<EmployeeFields>,
) -> Result<Json<ApiResponse<EmployeeDto>>> {
    let request = UpdateEmployee {
        tenant_id: ctx.require_tenant()?,
        id,
        fields,
    };

    let employee = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(employee)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<EmployeeId>,
) -> Result<Json<ApiResponse<()>>> {
    let request = DeleteEmployee {
        tenant_id: ctx.require_tenant()?,
        id,
    };

    dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success_with_message((), "Employee deleted")))
}

#[derive(Debug, Deserialize)]
struct AssignServicesBody {
    service_ids: Vec<ServiceId>,
}

async fn assign_services(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<EmployeeId>,
    Json(body): Json<AssignServicesBody>,
) -> Result<Json<ApiResponse<EmployeeDto>>> {
    let request = AssignServices {
        tenant_id: ctx.require_tenant()?,
        employee_id: id,
        service_ids: body.service_ids,
    };

    let employee = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(employee)))
}
