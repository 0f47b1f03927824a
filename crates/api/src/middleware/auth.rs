//! Authentication extractor.
//!
//! Resolves the caller's identity from the `Authorization: Bearer` header
//! into a [`RequestContext`] that routes pass explicitly into dispatch.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;
use crate::pipeline::RequestContext;
use crate::state::AppState;

/// Extractor that requires a valid bearer access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     State(state): State<AppState>,
///     CurrentUser(ctx): CurrentUser,
/// ) -> Result<Json<ApiResponse<Dto>>> {
///     let out = dispatch_query(&state, &ctx, request).await?;
///     Ok(Json(ApiResponse::success(out)))
/// }
/// ```
pub struct CurrentUser(pub RequestContext);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let claims = state.tokens().decode_access_token(token)?;

        // Tag the caller for error correlation
        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(claims.sub.to_string()),
                ..Default::default()
            }));
        });

        Ok(Self(RequestContext::authenticated(
            claims.sub,
            claims.tenant,
            claims.role,
        )))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
