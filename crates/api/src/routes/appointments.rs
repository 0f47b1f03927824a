//! Appointment routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use slotwise_core::{
    AppointmentId, AppointmentStatus, CustomerId, EmployeeId, Page, ServiceId,
};

use super::ListQuery;
use crate::db::AppointmentFilter;
use crate::error::Result;
use crate::handlers::appointments::{
    AppointmentDto, CancelAppointment, CompleteAppointment, ConfirmAppointment,
    CreateAppointment, DeleteAppointment, GetAppointmentDetail, GetAppointmentsList,
    GetAvailableSlots, MarkNoShow, RescheduleAppointment, StartAppointment,
};
use crate::middleware::CurrentUser;
use crate::pipeline::{dispatch_command, dispatch_query};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Create the appointment routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/slots", get(available_slots))
        .route("/{id}", get(detail).delete(remove))
        .route("/{id}/reschedule", post(reschedule))
        .route("/{id}/confirm", post(confirm))
        .route("/{id}/start", post(start))
        .route("/{id}/complete", post(complete))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/no-show", post(no_show))
}

// serde_urlencoded cannot flatten `ListQuery` here, so the paging fields are
// repeated inline.
#[derive(Debug, Deserialize)]
struct AppointmentListQuery {
    page: Option<u32>,
    page_size: Option<u32>,
    q: Option<String>,
    sort_by: Option<String>,
    sort_asc: Option<bool>,
    refresh: Option<bool>,
    employee_id: Option<EmployeeId>,
    customer_id: Option<CustomerId>,
    status: Option<AppointmentStatus>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<ApiResponse<Page<AppointmentDto>>>> {
    let list = ListQuery {
        page: query.page,
        page_size: query.page_size,
        q: query.q,
        sort_by: query.sort_by,
        sort_asc: query.sort_asc,
        refresh: query.refresh,
    };

    let request = GetAppointmentsList {
        tenant_id: ctx.require_tenant()?,
        filter: AppointmentFilter {
            employee_id: query.employee_id,
            customer_id: query.customer_id,
            status: query.status,
            from: query.from,
            to: query.to,
        },
        params: list.page_params(),
        refresh: list.refresh(),
    };

    let page = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(page)))
}

#[derive(Debug, Deserialize)]
struct SlotsQuery {
    employee_id: EmployeeId,
    service_id: ServiceId,
    date: NaiveDate,
}

async fn available_slots(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<ApiResponse<Vec<DateTime<Utc>>>>> {
    let request = GetAvailableSlots {
        tenant_id: ctx.require_tenant()?,
        employee_id: query.employee_id,
        service_id: query.service_id,
        date: query.date,
    };

    let slots = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(slots)))
}

async fn detail(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<ApiResponse<AppointmentDto>>> {
    let request = GetAppointmentDetail {
        tenant_id: ctx.require_tenant()?,
        id,
    };

    let appointment = dispatch_query(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

#[derive(Debug, Deserialize)]
struct CreateAppointmentBody {
    customer_id: CustomerId,
    employee_id: EmployeeId,
    service_id: ServiceId,
    start_time: DateTime<Utc>,
    notes: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(body): Json<CreateAppointmentBody>,
) -> Result<Json<ApiResponse<AppointmentDto>>> {
    let request = CreateAppointment {
        tenant_id: ctx.require_tenant()?,
        customer_id: body.customer_id,
        employee_id: body.employee_id,
        service_id: body.service_id,
        start_time: body.start_time,
        notes: body.notes,
    };

    let appointment = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

#[derive(Debug, Deserialize)]
struct RescheduleBody {
    start_time: DateTime<Utc>,
}

async fn reschedule(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<AppointmentId>,
    Json(body): Json<RescheduleBody>,
) -> Result<Json<ApiResponse<AppointmentDto>>> {
    let request = RescheduleAppointment {
        tenant_id: ctx.require_tenant()?,
        id,
        start_time: body.start_time,
    };

    let appointment = dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

macro_rules! status_route {
    ($fn_name:ident, $request:ident) => {
        async fn $fn_name(
            State(state): State<AppState>,
            CurrentUser(ctx): CurrentUser,
            Path(id): Path<AppointmentId>,
        ) -> Result<Json<ApiResponse<AppointmentDto>>> {
            let request = $request {
                tenant_id: ctx.require_tenant()?,
                id,
            };

            let appointment = dispatch_command(&state, &ctx, request).await?;
            Ok(Json(ApiResponse::success(appointment)))
        }
    };
}

status_route!(confirm, ConfirmAppointment);
status_route!(start, StartAppointment);
status_route!(complete, CompleteAppointment);
status_route!(cancel, CancelAppointment);
status_route!(no_show, MarkNoShow);

async fn remove(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<ApiResponse<()>>> {
    let request = DeleteAppointment {
        tenant_id: ctx.require_tenant()?,
        id,
    };

    dispatch_command(&state, &ctx, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Appointment deleted",
    )))
}
