//! Tenant profile routes. Settings are nested under `/settings`.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use serde::Deserialize;

use super::settings;
use crate::error::Result;
use crate::handlers::tenants::{GetCurrentTenant, TenantDto, UpdateTenant};
use crate::middleware::CurrentUser;
use crate::pipeline::{dispatch_command, dispatch_query};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Create the tenant routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(current).put(update))
        .merge(settings::routes())
}

async fn current(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<TenantDto>>> {
    let request = GetCurrentTenant {
        tenant_id: ctx.require_tenant()?,
    };

    let tenant = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(tenant)))
}

#[derive(Debug, Deserialize)]
struct UpdateTenantBody {
    name: String,
    contact_email: String,
    timezone: String,
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(body): Json<UpdateTenantBody>,
) -> Result<Json<ApiResponse<TenantDto>>> {
    let request = UpdateTenant {
        tenant_id: ctx.require_tenant()?,
        name: body.name,
        contact_email: body.contact_email,
        timezone: body.timezone,
    };

    let tenant = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(tenant)))
}
