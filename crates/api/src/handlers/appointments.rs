//! Appointment commands and queries.
//!
//! Booking enforces, in order: referenced entities exist and belong to the
//! caller's tenant, the employee offers the service, and the computed slot
//! `[start, start + duration)` overlaps no non-terminal appointment for the
//! employee. Status commands are gated by the state machine owned by
//! `slotwise_core::AppointmentStatus`.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use slotwise_core::{
    AppointmentId, AppointmentStatus, CustomerId, EmployeeId, Page, PageParams, ServiceId, TenantId,
};

use super::{ensure_same_tenant, page_key_suffix};
use crate::db::appointments::NewAppointment;
use crate::db::{
    AppointmentFilter, AppointmentRepository, CustomerRepository, EmployeeRepository,
    ServiceRepository, SettingsRepository,
};
use crate::error::AppError;
use crate::models::appointment::Appointment;
use crate::models::settings::TenantSettings;
use crate::pipeline::{CachePolicy, Command, Handler, Invalidation, Query, Request, RequestContext};
use crate::state::AppState;

/// Rejection message for an occupied slot.
const SLOT_TAKEN: &str = "Selected time slot is not available";

/// Availability results change often; cache them briefly.
const SLOTS_TTL: StdDuration = StdDuration::from_secs(30);

/// Appointment as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDto {
    pub id: AppointmentId,
    pub customer_id: CustomerId,
    pub employee_id: EmployeeId,
    pub service_id: ServiceId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentDto {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            customer_id: appointment.customer_id,
            employee_id: appointment.employee_id,
            service_id: appointment.service_id,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: appointment.status,
            notes: appointment.notes,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

fn list_pattern(tenant_id: TenantId) -> String {
    format!("appointments_list_t{tenant_id}")
}

fn slots_pattern(tenant_id: TenantId) -> String {
    format!("slots_t{tenant_id}")
}

/// Every appointment write shifts both listings and computed availability.
fn write_invalidation(tenant_id: TenantId) -> Invalidation {
    Invalidation::patterns([list_pattern(tenant_id), slots_pattern(tenant_id)])
}

// =============================================================================
// Queries
// =============================================================================

/// Paged appointment listing with optional filters.
#[derive(Debug, Validate)]
pub struct GetAppointmentsList {
    pub tenant_id: TenantId,
    pub filter: AppointmentFilter,
    pub params: PageParams,
    pub refresh: bool,
}

impl Request for GetAppointmentsList {
    const NAME: &'static str = "GetAppointmentsList";
    type Output = Page<AppointmentDto>;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetAppointmentsList {
    fn cache_policy(&self) -> Option<CachePolicy> {
        let f = &self.filter;
        let key = format!(
            "{}_e{}_c{}_st{}_f{}_u{}{}",
            list_pattern(self.tenant_id),
            f.employee_id.map(|v| v.to_string()).unwrap_or_default(),
            f.customer_id.map(|v| v.to_string()).unwrap_or_default(),
            f.status.map(|v| v.to_string()).unwrap_or_default(),
            f.from.map(|v| v.timestamp().to_string()).unwrap_or_default(),
            f.to.map(|v| v.timestamp().to_string()).unwrap_or_default(),
            page_key_suffix(&self.params)
        );
        Some(CachePolicy::new(key).bypass_if(self.refresh))
    }
}

impl Handler<GetAppointmentsList> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetAppointmentsList,
    ) -> Result<Page<AppointmentDto>, AppError> {
        let repo = AppointmentRepository::new(self.pool());
        let (appointments, total) = repo
            .list(request.tenant_id, &request.filter, &request.params)
            .await?;

        let items = appointments.into_iter().map(Into::into).collect();
        Ok(Page::new(items, &request.params, total))
    }
}

/// Single appointment by id.
#[derive(Debug, Validate)]
pub struct GetAppointmentDetail {
    pub tenant_id: TenantId,
    pub id: AppointmentId,
}

impl Request for GetAppointmentDetail {
    const NAME: &'static str = "GetAppointmentDetail";
    type Output = AppointmentDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetAppointmentDetail {}

impl Handler<GetAppointmentDetail> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetAppointmentDetail,
    ) -> Result<AppointmentDto, AppError> {
        let repo = AppointmentRepository::new(self.pool());
        let appointment = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {}", request.id)))?;

        ensure_same_tenant(appointment.tenant_id, request.tenant_id)?;

        Ok(appointment.into())
    }
}

/// Free slot start times for an employee/service on a given day.
#[derive(Debug, Validate)]
pub struct GetAvailableSlots {
    pub tenant_id: TenantId,
    pub employee_id: EmployeeId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
}

impl Request for GetAvailableSlots {
    const NAME: &'static str = "GetAvailableSlots";
    type Output = Vec<DateTime<Utc>>;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Query for GetAvailableSlots {
    fn cache_policy(&self) -> Option<CachePolicy> {
        let key = format!(
            "{}_e{}_s{}_d{}",
            slots_pattern(self.tenant_id),
            self.employee_id,
            self.service_id,
            self.date
        );
        Some(CachePolicy::new(key).with_ttl(SLOTS_TTL))
    }
}

impl Handler<GetAvailableSlots> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: GetAvailableSlots,
    ) -> Result<Vec<DateTime<Utc>>, AppError> {
        let employees = EmployeeRepository::new(self.pool());
        let employee = employees
            .find_by_id(request.employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", request.employee_id)))?;
        ensure_same_tenant(employee.tenant_id, request.tenant_id)?;

        let services = ServiceRepository::new(self.pool());
        let service = services
            .find_by_id(request.service_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("service {}", request.service_id)))?;
        ensure_same_tenant(service.tenant_id, request.tenant_id)?;

        if !employees
            .offers_service(request.employee_id, request.service_id)
            .await?
        {
            return Ok(Vec::new());
        }

        let settings = SettingsRepository::new(self.pool())
            .get(request.tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("tenant settings".to_string()))?;

        let now = Utc::now();
        let day_start = request.date.and_hms_opt(0, 0, 0).map_or(now, |t| t.and_utc());
        let day_end = day_start + Duration::days(1);

        let busy = AppointmentRepository::new(self.pool())
            .for_employee_between(request.employee_id, day_start, day_end)
            .await?;

        Ok(compute_free_slots(
            request.date,
            &settings,
            service.duration(),
            &busy,
            now,
        ))
    }
}

/// Slot start times within business hours where the whole service duration
/// fits without touching a busy interval, honoring minimum notice and the
/// booking window.
fn compute_free_slots(
    date: NaiveDate,
    settings: &TenantSettings,
    service_duration: Duration,
    busy: &[Appointment],
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let Some(hours) = settings.business_hours.for_weekday(date.weekday()) else {
        return Vec::new();
    };

    let window_end = now + Duration::days(i64::from(settings.booking_window_days));
    let earliest = now + Duration::minutes(i64::from(settings.min_notice_minutes));
    let granularity = Duration::minutes(i64::from(settings.slot_granularity_minutes.max(1)));

    let open = date.and_time(hours.open).and_utc();
    let close = date.and_time(hours.close).and_utc();

    let mut slots = Vec::new();
    let mut slot_start = open;
    while slot_start + service_duration <= close {
        let slot_end = slot_start + service_duration;
        let in_window = slot_start >= earliest && slot_start <= window_end;
        let free = !busy
            .iter()
            .any(|a| slot_start < a.end_time && slot_end > a.start_time);

        if in_window && free {
            slots.push(slot_start);
        }
        slot_start = slot_start + granularity;
    }

    slots
}

// =============================================================================
// Commands
// =============================================================================

/// Book an appointment.
#[derive(Debug, Validate)]
pub struct CreateAppointment {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub employee_id: EmployeeId,
    pub service_id: ServiceId,
    pub start_time: DateTime<Utc>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl Request for CreateAppointment {
    const NAME: &'static str = "CreateAppointment";
    type Output = AppointmentDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for CreateAppointment {
    fn invalidation(&self) -> Invalidation {
        write_invalidation(self.tenant_id)
    }
}

impl Handler<CreateAppointment> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: CreateAppointment,
    ) -> Result<AppointmentDto, AppError> {
        let customers = CustomerRepository::new(self.pool());
        let customer = customers
            .find_by_id(request.customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer {}", request.customer_id)))?;
        ensure_same_tenant(customer.tenant_id, request.tenant_id)?;

        let employees = EmployeeRepository::new(self.pool());
        let employee = employees
            .find_by_id(request.employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", request.employee_id)))?;
        ensure_same_tenant(employee.tenant_id, request.tenant_id)?;

        let services = ServiceRepository::new(self.pool());
        let service = services
            .find_by_id(request.service_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("service {}", request.service_id)))?;
        ensure_same_tenant(service.tenant_id, request.tenant_id)?;

        if !service.active {
            return Err(AppError::BusinessRule(
                "Service is no longer offered".to_string(),
            ));
        }

        if !employees
            .offers_service(request.employee_id, request.service_id)
            .await?
        {
            return Err(AppError::BusinessRule(
                "Employee does not offer this service".to_string(),
            ));
        }

        let end_time = request.start_time + service.duration();

        let repo = AppointmentRepository::new(self.pool());
        let appointment = repo
            .create_if_available(NewAppointment {
                tenant_id: request.tenant_id,
                customer_id: request.customer_id,
                employee_id: request.employee_id,
                service_id: request.service_id,
                start_time: request.start_time,
                end_time,
                notes: request.notes.as_deref(),
                actor: ctx.actor(),
            })
            .await?
            .ok_or_else(|| AppError::BusinessRule(SLOT_TAKEN.to_string()))?;

        Ok(appointment.into())
    }
}

/// Move an appointment to a new start time.
#[derive(Debug, Validate)]
pub struct RescheduleAppointment {
    pub tenant_id: TenantId,
    pub id: AppointmentId,
    pub start_time: DateTime<Utc>,
}

impl Request for RescheduleAppointment {
    const NAME: &'static str = "RescheduleAppointment";
    type Output = AppointmentDto;

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for RescheduleAppointment {
    fn invalidation(&self) -> Invalidation {
        write_invalidation(self.tenant_id)
    }
}

impl Handler<RescheduleAppointment> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: RescheduleAppointment,
    ) -> Result<AppointmentDto, AppError> {
        let repo = AppointmentRepository::new(self.pool());
        let existing = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {}", request.id)))?;

        ensure_same_tenant(existing.tenant_id, request.tenant_id)?;

        if existing.status.is_terminal() {
            return Err(AppError::BusinessRule(
                "Appointment can no longer be modified".to_string(),
            ));
        }

        let duration = existing.end_time - existing.start_time;
        let end_time = request.start_time + duration;

        let appointment = repo
            .reschedule_if_available(
                request.id,
                existing.employee_id,
                request.start_time,
                end_time,
                ctx.actor(),
            )
            .await?
            .ok_or_else(|| AppError::BusinessRule(SLOT_TAKEN.to_string()))?;

        Ok(appointment.into())
    }
}

/// Shared shape of the status-transition commands.
macro_rules! status_command {
    ($name:ident, $const_name:literal) => {
        #[derive(Debug, Validate)]
        pub struct $name {
            pub tenant_id: TenantId,
            pub id: AppointmentId,
        }

        impl Request for $name {
            const NAME: &'static str = $const_name;
            type Output = AppointmentDto;

            fn stamp_tenant(&mut self, tenant: TenantId) {
                self.tenant_id = tenant;
            }
        }

        impl Command for $name {
            fn invalidation(&self) -> Invalidation {
                write_invalidation(self.tenant_id)
            }
        }
    };
}

status_command!(ConfirmAppointment, "ConfirmAppointment");
status_command!(StartAppointment, "StartAppointment");
status_command!(CompleteAppointment, "CompleteAppointment");
status_command!(CancelAppointment, "CancelAppointment");
status_command!(MarkNoShow, "MarkNoShow");

/// Load, ownership-check, and transition an appointment's status.
async fn transition(
    state: &AppState,
    ctx: &RequestContext,
    tenant_id: TenantId,
    id: AppointmentId,
    next: AppointmentStatus,
    rejection: &str,
) -> Result<AppointmentDto, AppError> {
    let repo = AppointmentRepository::new(state.pool());
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))?;

    ensure_same_tenant(existing.tenant_id, tenant_id)?;

    if !existing.status.can_transition_to(next) {
        return Err(AppError::BusinessRule(rejection.to_string()));
    }

    let updated = repo.update_status(id, next, ctx.actor()).await?;
    Ok(updated.into())
}

impl Handler<ConfirmAppointment> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: ConfirmAppointment,
    ) -> Result<AppointmentDto, AppError> {
        transition(
            self,
            ctx,
            request.tenant_id,
            request.id,
            AppointmentStatus::Confirmed,
            "Only scheduled appointments can be confirmed",
        )
        .await
    }
}

impl Handler<StartAppointment> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: StartAppointment,
    ) -> Result<AppointmentDto, AppError> {
        transition(
            self,
            ctx,
            request.tenant_id,
            request.id,
            AppointmentStatus::InProgress,
            "Only confirmed appointments can be started",
        )
        .await
    }
}

impl Handler<CompleteAppointment> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: CompleteAppointment,
    ) -> Result<AppointmentDto, AppError> {
        transition(
            self,
            ctx,
            request.tenant_id,
            request.id,
            AppointmentStatus::Completed,
            "Only in-progress appointments can be completed",
        )
        .await
    }
}

impl Handler<CancelAppointment> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: CancelAppointment,
    ) -> Result<AppointmentDto, AppError> {
        transition(
            self,
            ctx,
            request.tenant_id,
            request.id,
            AppointmentStatus::Canceled,
            "Appointment can no longer be canceled",
        )
        .await
    }
}

impl Handler<MarkNoShow> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: MarkNoShow,
    ) -> Result<AppointmentDto, AppError> {
        transition(
            self,
            ctx,
            request.tenant_id,
            request.id,
            AppointmentStatus::NoShow,
            "Appointment is already finalized",
        )
        .await
    }
}

/// Soft-delete an appointment.
#[derive(Debug, Validate)]
pub struct DeleteAppointment {
    pub tenant_id: TenantId,
    pub id: AppointmentId,
}

impl Request for DeleteAppointment {
    const NAME: &'static str = "DeleteAppointment";
    type Output = ();

    fn stamp_tenant(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }
}

impl Command for DeleteAppointment {
    fn invalidation(&self) -> Invalidation {
        write_invalidation(self.tenant_id)
    }
}

impl Handler<DeleteAppointment> for AppState {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: DeleteAppointment,
    ) -> Result<(), AppError> {
        let repo = AppointmentRepository::new(self.pool());
        let existing = repo
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {}", request.id)))?;

        ensure_same_tenant(existing.tenant_id, request.tenant_id)?;

        repo.soft_delete(request.id, ctx.actor()).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use slotwise_core::UserId;

    use super::*;

    fn settings() -> TenantSettings {
        let mut s = TenantSettings::defaults_for(TenantId::generate());
        s.slot_granularity_minutes = 30;
        s.min_notice_minutes = 0;
        s
    }

    fn appointment(start: DateTime<Utc>, end: DateTime<Utc>) -> Appointment {
        Appointment {
            id: AppointmentId::generate(),
            tenant_id: TenantId::generate(),
            customer_id: CustomerId::generate(),
            employee_id: EmployeeId::generate(),
            service_id: ServiceId::generate(),
            start_time: start,
            end_time: end,
            status: AppointmentStatus::Scheduled,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: Some(UserId::generate()),
            updated_by: None,
        }
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
        date.and_hms_opt(h, m, 0).unwrap().and_utc()
    }

    // A weekday comfortably in the future relative to `now`.
    fn test_day() -> (NaiveDate, DateTime<Utc>) {
        let date = NaiveDate::from_ymd_opt(2030, 6, 3).unwrap(); // a Monday
        let now = at(date, 0, 0) - Duration::days(7);
        (date, now)
    }

    #[test]
    fn test_slots_empty_on_closed_day() {
        let (_, now) = test_day();
        let sunday = NaiveDate::from_ymd_opt(2030, 6, 2).unwrap();
        let slots = compute_free_slots(sunday, &settings(), Duration::minutes(30), &[], now);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_slots_fill_open_hours_when_free() {
        let (date, now) = test_day();
        let slots = compute_free_slots(date, &settings(), Duration::minutes(30), &[], now);

        // 09:00-17:00 at 30-minute granularity, last start 16:30
        assert_eq!(slots.first().copied(), Some(at(date, 9, 0)));
        assert_eq!(slots.last().copied(), Some(at(date, 16, 30)));
        assert_eq!(slots.len(), 16);
    }

    #[test]
    fn test_slots_skip_busy_intervals() {
        let (date, now) = test_day();
        let busy = vec![appointment(at(date, 10, 0), at(date, 10, 30))];
        let slots = compute_free_slots(date, &settings(), Duration::minutes(30), &busy, now);

        assert!(!slots.contains(&at(date, 10, 0)));
        assert!(slots.contains(&at(date, 9, 30)));
        assert!(slots.contains(&at(date, 10, 30)));
    }

    #[test]
    fn test_slot_overlapping_busy_tail_is_skipped() {
        let (date, now) = test_day();
        // 60-minute service; busy 10:00-10:30 blocks starts at 09:30 and 10:00
        let busy = vec![appointment(at(date, 10, 0), at(date, 10, 30))];
        let slots = compute_free_slots(date, &settings(), Duration::minutes(60), &busy, now);

        assert!(!slots.contains(&at(date, 9, 30)));
        assert!(!slots.contains(&at(date, 10, 0)));
        assert!(slots.contains(&at(date, 9, 0)));
        assert!(slots.contains(&at(date, 10, 30)));
    }

    #[test]
    fn test_slots_honor_min_notice() {
        let (date, _) = test_day();
        let mut s = settings();
        s.min_notice_minutes = 60;
        // "now" is 09:30 on the day itself: 09:00-10:30 starts are too soon
        let now = at(date, 9, 30);
        let slots = compute_free_slots(date, &s, Duration::minutes(30), &[], now);

        assert_eq!(slots.first().copied(), Some(at(date, 10, 30)));
    }

    #[test]
    fn test_slots_honor_booking_window() {
        let (date, _) = test_day();
        let mut s = settings();
        s.booking_window_days = 3;
        // The date is a week past "now", outside the 3-day window
        let now = at(date, 0, 0) - Duration::days(7);
        let slots = compute_free_slots(date, &s, Duration::minutes(30), &[], now);
        assert!(slots.is_empty());
    }
}
