//! Service routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use slotwise_core::{Page, ServiceId};

use super::ListQuery;
use crate::error::Result;
use crate::handlers::services::{
    CreateService, DeleteService, GetServiceDetail, GetServicesList, ServiceDto, ServiceFields,
    UpdateService,
};
use crate::middleware::CurrentUser;
use crate::pipeline::{dispatch_command, dispatch_query};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Create the service routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<ServiceDto>>>> {
    let request = GetServicesList {
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
    Path(id): Path<ServiceId>,
) -> Result<Json<ApiResponse<ServiceDto>>> {
    let request = GetServiceDetail {
        tenant_id: ctx.require_tenant()?,
        id,
    };

    let service = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(service)))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(fields): Json<ServiceFields>,
) -> Result<Json<ApiResponse<ServiceDto>>> {
    let request = CreateService {
        tenant_id: ctx.require_tenant()?,
        fields,
    };

    let service = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(service)))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<ServiceId>,
    Json(fields): Json<ServiceFields>,
) -> Result<Json<ApiResponse<ServiceDto>>> {
    let request = UpdateService {
        tenant_id: ctx.require_tenant()?,
        id,
        fields,
    };

    let service = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(service)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<ServiceId>,
) -> Result<Json<ApiResponse<()>>> {
    let request = DeleteService {
        tenant_id: ctx.require_tenant()?,
        id,
    };

    dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success_with_message((), "Service deleted")))
}
