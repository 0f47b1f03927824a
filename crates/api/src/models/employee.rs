//! Employee aggregate.

use chrono::{DateTime, Utc};

use slotwise_core::{EmployeeId, TenantId, UserId};

/// A staff member who performs services and owns a calendar of appointments.
#[derive(Debug, Clone)]
pub struct Employee {
    pub id: EmployeeId,
    pub tenant_id: TenantId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

impl Employee {
    /// Display name used in schedules.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
