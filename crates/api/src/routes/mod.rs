//! HTTP route handlers.
//!
//! Routes are thin: extract, build the command/query, dispatch through the
//! pipeline, wrap the result in the response envelope. All business logic
//! lives in the handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (checks database)
//!
//! # Auth (no bearer token required except logout)
//! POST /api/v1/auth/register           - Register tenant + owner
//! POST /api/v1/auth/login              - Password login
//! POST /api/v1/auth/refresh            - Rotate refresh token
//! POST /api/v1/auth/logout             - Revoke refresh token
//!
//! # Tenant
//! GET  /api/v1/tenant                  - Current tenant profile
//! PUT  /api/v1/tenant                  - Update profile (owner)
//! GET  /api/v1/tenant/settings         - Booking settings
//! PUT  /api/v1/tenant/settings         - Update settings (owner)
//!
//! # Customers / Employees / Services (uniform CRUD)
//! GET|POST  /api/v1/<entity>           - List (paged) / create
//! GET|PUT|DELETE /api/v1/<entity>/{id} - Detail / update / soft-delete
//! PUT  /api/v1/employees/{id}/services - Replace assigned services
//!
//! # Appointments
//! GET  /api/v1/appointments            - List (filters: employee, customer,
//!                                        status, from, to)
//! POST /api/v1/appointments            - Book
//! GET  /api/v1/appointments/slots      - Free slots for employee/service/date
//! GET  /api/v1/appointments/{id}       - Detail
//! DELETE /api/v1/appointments/{id}     - Soft-delete
//! POST /api/v1/appointments/{id}/reschedule|confirm|start|complete|cancel|no-show
//! ```

pub mod appointments;
pub mod auth;
pub mod customers;
pub mod employees;
pub mod services;
pub mod settings;
pub mod tenants;

use axum::Router;
use serde::Deserialize;

use slotwise_core::PageParams;

use crate::state::AppState;

/// Compose every API route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/auth", auth::routes())
        .nest("/api/v1/tenant", tenants::routes())
        .nest("/api/v1/customers", customers::routes())
        .nest("/api/v1/employees", employees::routes())
        .nest("/api/v1/services", services::routes())
        .nest("/api/v1/appointments", appointments::routes())
}

/// Query-string shape shared by every list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Search term.
    pub q: Option<String>,
    pub sort_by: Option<String>,
    pub sort_asc: Option<bool>,
    /// Skip the cache read for this request.
    pub refresh: Option<bool>,
}

impl ListQuery {
    /// Normalize into [`PageParams`].
    #[must_use]
    pub fn page_params(&self) -> PageParams {
        let mut params = PageParams::new(self.page, self.page_size);
        params.search = self.q.clone().filter(|s| !s.trim().is_empty());
        params.sort_by = self.sort_by.clone();
        params.sort_asc = self.sort_asc.unwrap_or(true);
        params
    }

    /// Whether the caller asked to bypass the cache.
    #[must_use]
    pub fn refresh(&self) -> bool {
        self.refresh.unwrap_or(false)
    }
}
