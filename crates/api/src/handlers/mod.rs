//! Request handlers, one module per aggregate.
//!
//! Each module defines the command/query types for its aggregate, their DTOs,
//! and the [`Handler`](crate::pipeline::Handler) implementations on
//! [`AppState`](crate::state::AppState). Handlers follow one contract:
//! load by id, recheck tenant ownership, apply business rules, persist, map
//! to a DTO.

pub mod appointments;
pub mod auth;
pub mod customers;
pub mod employees;
pub mod services;
pub mod settings;
pub mod tenants;

use slotwise_core::TenantId;

use crate::error::AppError;

/// Reject with Forbidden when a loaded entity belongs to a different tenant
/// than the (stamped) request.
pub(crate) fn ensure_same_tenant(
    entity_tenant: TenantId,
    request_tenant: TenantId,
) -> Result<(), AppError> {
    if entity_tenant == request_tenant {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "entity belongs to a different tenant".to_string(),
        ))
    }
}

/// Build the `_p{page}_s{size}_q{search}_sb{sort}_sa{asc}` suffix list cache
/// keys share.
pub(crate) fn page_key_suffix(params: &slotwise_core::PageParams) -> String {
    format!(
        "_p{}_s{}_q{}_sb{}_sa{}",
        params.page,
        params.page_size,
        params.search.as_deref().unwrap_or(""),
        params.sort_by.as_deref().unwrap_or(""),
        params.sort_asc
    )
}

#[cfg(test)]
mod tests {
    use slotwise_core::PageParams;

    use super::*;

    #[test]
    fn test_ensure_same_tenant() {
        let a = TenantId::generate();
        let b = TenantId::generate();
        assert!(ensure_same_tenant(a, a).is_ok());
        assert!(matches!(
            ensure_same_tenant(a, b),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_page_key_suffix_reflects_all_fields() {
        let mut params = PageParams::new(Some(2), Some(50));
        params.search = Some("ann".to_string());
        params.sort_by = Some("last_name".to_string());
        params.sort_asc = false;
        assert_eq!(page_key_suffix(&params), "_p2_s50_qann_sblast_name_safalse");
    }
}
