//! Tenant settings routes.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use serde::Deserialize;

use crate::error::Result;
use crate::handlers::settings::{GetSettings, SettingsDto, UpdateSettings};
use crate::middleware::CurrentUser;
use crate::models::settings::BusinessHours;
use crate::pipeline::{dispatch_command, dispatch_query};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Create the settings routes router (mounted under `/tenant`).
pub fn routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<SettingsDto>>> {
    let request = GetSettings {
        tenant_id: ctx.require_tenant()?,
    };

    let settings = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(settings)))
}

#[derive(Debug, Deserialize)]
struct UpdateSettingsBody {
    slot_granularity_minutes: i32,
    min_notice_minutes: i32,
    booking_window_days: i32,
    cancellation_window_hours: i32,
    business_hours: BusinessHours,
}

async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(body): Json<UpdateSettingsBody>,
) -> Result<Json<ApiResponse<SettingsDto>>> {
    let request = UpdateSettings {
        tenant_id: ctx.require_tenant()?,
        slot_granularity_minutes: body.slot_granularity_minutes,
        min_notice_minutes: body.min_notice_minutes,
        booking_window_days: body.booking_window_days,
        cancellation_window_hours: body.cancellation_window_hours,
        business_hours: body.business_hours,
    };

    let settings = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(settings)))
}
