//! Customer routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use slotwise_core::{CustomerId, Page};

use super::ListQuery;
use crate::error::Result;
use crate::handlers::customers::{
    CreateCustomer, CustomerDto, CustomerFields, DeleteCustomer, GetCustomerDetail,
    GetCustomersList, UpdateCustomer,
};
use crate::middleware::CurrentUser;
use crate::pipeline::{dispatch_command, dispatch_query};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Create the customer routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<CustomerDto>>>> {
    let request = GetCustomersList {
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
    Path(id): Path<CustomerId>,
) -> Result<Json<ApiResponse<CustomerDto>>> {
    let request = GetCustomerDetail {
        tenant_id: ctx.require_tenant()?,
        id,
    };

    let customer = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(customer)))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(fields): Json<CustomerFields>,
) -> Result<Json<ApiResponse<CustomerDto>>> {
    let request = CreateCustomer {
        tenant_id: ctx.require_tenant()?,
        fields,
    };

    let customer = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(customer)))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<CustomerId>,
    Json(fields): Json<CustomerFields>,
) -> Result<Json<ApiResponse<CustomerDto>>> {
    let request = UpdateCustomer {
        tenant_id: ctx.require_tenant()?,
        id,
        fields,
    };

    let customer = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(customer)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<CustomerId>,
) -> Result<Json<ApiResponse<()>>> {
    let request = DeleteCustomer {
        tenant_id: ctx.require_tenant()?,
        id,
    };

    dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success_with_message((), "Customer deleted")))
}
