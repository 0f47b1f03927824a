//! Service aggregate.

use chrono::{DateTime, Utc};

use slotwise_core::{Price, ServiceId, TenantId, UserId};

/// A bookable offering with a fixed duration and price.
#[derive(Debug, Clone)]
pub struct Service {
    pub id: ServiceId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price: Price,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

impl Service {
    /// Appointment length as a chrono duration.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}
