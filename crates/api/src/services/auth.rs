//! Authentication service.
//!
//! Password login issues a short-lived JWT access token (carrying user id,
//! tenant id, and role) plus an opaque refresh token stored per user and
//! rotated on every use.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use slotwise_core::{Email, EmailError, TenantId, UserId, UserRole};

use crate::db::{RepositoryError, UserRepository};
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes in an opaque refresh token.
const REFRESH_TOKEN_BYTES: usize = 32;

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailTaken,

    #[error("{0}")]
    WeakPassword(String),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid access token")]
    TokenInvalid,

    #[error("access token expired")]
    TokenExpired,

    #[error("invalid refresh token")]
    RefreshTokenInvalid,

    #[error("token creation failed: {0}")]
    TokenCreation(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

// =============================================================================
// Passwords
// =============================================================================

/// Validate password strength.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` with the requirement that failed.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2id and a fresh salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored argon2 hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch and
/// `AuthError::PasswordHash` for an unparseable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

// =============================================================================
// Tokens
// =============================================================================

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub sub: UserId,
    /// Tenant id the user belongs to.
    pub tenant: TenantId,
    /// Dashboard role.
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates access tokens; generates opaque refresh tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Create a token service from the configured signing secret and TTLs.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    /// Access token lifetime in seconds, for token responses.
    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenCreation` if signing fails.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id,
            tenant: user.tenant_id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate an access token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for expired tokens and
    /// `AuthError::TokenInvalid` for everything else.
    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })
    }

    /// Generate a fresh opaque refresh token.
    #[must_use]
    pub fn new_refresh_token(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Expiry instant for a refresh token issued now.
    #[must_use]
    pub fn refresh_expires_at(&self) -> DateTime<Utc> {
        Utc::now() + self.refresh_ttl
    }
}

/// Access + refresh token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

// =============================================================================
// Auth service
// =============================================================================

/// Login, refresh, and logout over the user repository.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Login with email and password, issuing a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email or password is
    /// wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .find_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let pair = self.issue_pair(&user).await?;
        Ok((user, pair))
    }

    /// Rotate a refresh token: validate the stored token and expiry, then
    /// issue a new pair. The old refresh token stops working immediately.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RefreshTokenInvalid` for unknown or expired
    /// refresh tokens.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair), AuthError> {
        let (user, expires_at) = self
            .users
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;

        if expires_at < Utc::now() {
            // Expired tokens are cleared so they stop matching lookups.
            self.users.clear_refresh_token(user.id).await?;
            return Err(AuthError::RefreshTokenInvalid);
        }

        let pair = self.issue_pair(&user).await?;
        Ok((user, pair))
    }

    /// Revoke the user's refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn logout(&self, user_id: UserId) -> Result<(), AuthError> {
        self.users.clear_refresh_token(user_id).await?;
        Ok(())
    }

    /// Issue an access/refresh pair and persist the rotated refresh token.
    pub async fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access_token = self.tokens.issue_access_token(user)?;
        let refresh_token = self.tokens.new_refresh_token();

        self.users
            .store_refresh_token(user.id, &refresh_token, self.tokens.refresh_expires_at())
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.tokens.access_ttl_seconds(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_service() -> TokenService {
        TokenService::new(
            &SecretString::from("kJ8#mN2$pQ5@rT9!vW3%xZ6&aB4*cD7^"),
            15,
            30,
        )
    }

    fn user() -> User {
        User {
            id: UserId::generate(),
            tenant_id: TenantId::generate(),
            email: Email::parse("owner@studio.example").unwrap(),
            role: UserRole::Owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = token_service();
        let user = user();

        let token = tokens.issue_access_token(&user).unwrap();
        let claims = tokens.decode_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.tenant, user.tenant_id);
        assert_eq!(claims.role, UserRole::Owner);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = token_service();
        let token = tokens.issue_access_token(&user()).unwrap();

        let mut tampered = token;
        tampered.push('x');
        assert!(matches!(
            tokens.decode_access_token(&tampered),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_refresh_tokens_are_unique_and_opaque() {
        let tokens = token_service();
        let a = tokens.new_refresh_token();
        let b = tokens.new_refresh_token();
        assert_ne!(a, b);
        // 32 bytes base64url without padding
        assert_eq!(a.len(), 43);
    }
}
