//! Appointment aggregate.

use chrono::{DateTime, Utc};

use slotwise_core::{
    AppointmentId, AppointmentStatus, CustomerId, EmployeeId, ServiceId, TenantId, UserId,
};

/// A booked slot for one customer with one employee performing one service.
///
/// `end_time` is computed from the service duration at creation and kept in
/// sync on reschedule; it is never accepted from callers.
#[derive(Debug, Clone)]
pub struct Appointment {
    pub id: AppointmentId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub employee_id: EmployeeId,
    pub service_id: ServiceId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

impl Appointment {
    /// Whether the appointment may still be canceled.
    #[must_use]
    pub const fn can_be_canceled(&self) -> bool {
        self.status.can_be_canceled()
    }
}
