//! Dashboard user accounts.

use chrono::{DateTime, Utc};

use slotwise_core::{Email, TenantId, UserId, UserRole};

/// A dashboard account belonging to a tenant.
///
/// The refresh token is opaque and rotated on every use; only the current
/// value is stored.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: Email,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
