//! Tenant aggregate.

use chrono::{DateTime, Utc};

use slotwise_core::{Email, TenantId, UserId};

/// A business subscribed to Slotwise. All other aggregates hang off a tenant.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub contact_email: Email,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}
