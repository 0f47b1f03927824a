//! Authentication commands: tenant registration, login, refresh, logout.

use serde::{Deserialize, Serialize};
use validator::Validate;

use slotwise_core::Email;

use super::tenants::TenantDto;
use crate::db::TenantRepository;
use crate::db::tenants::NewTenantRegistration;
use crate::error::AppError;
use crate::models::user::User;
use crate::pipeline::{Command, Handler, Request, RequestContext};
use crate::services::auth::{AuthService, TokenPair, hash_password, validate_password};
use crate::state::AppState;

/// Authenticated user as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: slotwise_core::UserId,
    pub email: String,
    pub role: slotwise_core::UserRole,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.into_inner(),
            role: user.role,
        }
    }
}

/// Login / registration response: who you are plus your tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantDto>,
    pub tokens: TokenPair,
}

/// Derive a URL-safe slug from a business name.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

// =============================================================================
// Register
// =============================================================================

/// Register a business: tenant, default settings, and owner account in one
/// transaction, then a logged-in session.
#[derive(Debug, Validate)]
pub struct RegisterTenant {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub business_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub contact_email: String,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub timezone: String,
    #[validate(email(message = "must be a valid email address"))]
    pub owner_email: String,
    pub password: String,
}

impl Request for RegisterTenant {
    const NAME: &'static str = "RegisterTenant";
    const TENANT_SCOPED: bool = false;
    type Output = AuthSession;
}

impl Command for RegisterTenant {}

impl Handler<RegisterTenant> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: RegisterTenant,
    ) -> Result<AuthSession, AppError> {
        validate_password(&request.password)?;
        let password_hash = hash_password(&request.password)?;

        let contact_email = Email::parse(&request.contact_email)
            .map_err(|e| AppError::Validation(vec![format!("contact_email: {e}")]))?;
        let owner_email = Email::parse(&request.owner_email)
            .map_err(|e| AppError::Validation(vec![format!("owner_email: {e}")]))?;

        let slug = slugify(&request.business_name);
        if slug.is_empty() {
            return Err(AppError::Validation(vec![
                "business_name: must contain letters or digits".to_string(),
            ]));
        }

        let (tenant, owner) = TenantRepository::new(self.pool())
            .register(NewTenantRegistration {
                tenant_name: &request.business_name,
                slug: &slug,
                contact_email: &contact_email,
                timezone: &request.timezone,
                owner_email: &owner_email,
                owner_password_hash: &password_hash,
            })
            .await?;

        let auth = AuthService::new(self.pool(), self.tokens());
        let tokens = auth.issue_pair(&owner).await?;

        tracing::info!(tenant = %tenant.id, "tenant registered");

        Ok(AuthSession {
            user: owner.into(),
            tenant: Some(tenant.into()),
            tokens,
        })
    }
}

// =============================================================================
// Login / Refresh / Logout
// =============================================================================

/// Password login.
#[derive(Debug, Validate)]
pub struct Login {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

impl Request for Login {
    const NAME: &'static str = "Login";
    const TENANT_SCOPED: bool = false;
    type Output = AuthSession;
}

impl Command for Login {}

impl Handler<Login> for AppState {
    async fn handle(&self, _ctx: &RequestContext, request: Login) -> Result<AuthSession, AppError> {
        let auth = AuthService::new(self.pool(), self.tokens());
        let (user, tokens) = auth.login(&request.email, &request.password).await?;

        Ok(AuthSession {
            user: user.into(),
            tenant: None,
            tokens,
        })
    }
}

/// Rotate a refresh token into a fresh session.
#[derive(Debug, Validate)]
pub struct RefreshToken {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub refresh_token: String,
}

impl Request for RefreshToken {
    const NAME: &'static str = "RefreshToken";
    const TENANT_SCOPED: bool = false;
    type Output = AuthSession;
}

impl Command for RefreshToken {}

impl Handler<RefreshToken> for AppState {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: RefreshToken,
    ) -> Result<AuthSession, AppError> {
        let auth = AuthService::new(self.pool(), self.tokens());
        let (user, tokens) = auth.refresh(&request.refresh_token).await?;

        Ok(AuthSession {
            user: user.into(),
            tenant: None,
            tokens,
        })
    }
}

/// Revoke the caller's refresh token.
#[derive(Debug, Validate)]
pub struct Logout {}

impl Request for Logout {
    const NAME: &'static str = "Logout";
    type Output = ();
}

impl Command for Logout {}

impl Handler<Logout> for AppState {
    async fn handle(&self, ctx: &RequestContext, _request: Logout) -> Result<(), AppError> {
        let user_id = ctx
            .actor()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

        let auth = AuthService::new(self.pool(), self.tokens());
        auth.logout(user_id).await?;

        // Stop associating errors with the user
        sentry::configure_scope(|scope| scope.set_user(None));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Glow Beauty Studio"), "glow-beauty-studio");
        assert_eq!(slugify("  Bob's Barbers!  "), "bob-s-barbers");
        assert_eq!(slugify("___"), "");
        assert_eq!(slugify("Café 24/7"), "caf-24-7");
    }
}
