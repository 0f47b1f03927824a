//! Dashboard user repository: credentials and refresh tokens.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use slotwise_core::{Email, TenantId, UserId, UserRole};

use super::{RepositoryError, map_unique_violation};
use crate::models::user::User;

/// Internal row type for user queries. Shared with the tenant registration
/// transaction.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: UserId,
    pub(crate) tenant_id: TenantId,
    pub(crate) email: Email,
    pub(crate) role: UserRole,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            email: row.email,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, tenant_id, email, role, created_at, updated_at";

/// Repository for dashboard user operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if no such user exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, Row>(&format!(
            "SELECT {USER_COLUMNS}, password_hash
             FROM app_user WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    /// Create a staff user under an existing tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        email: &Email,
        password_hash: &str,
        role: UserRole,
        actor: Option<UserId>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO app_user (id, tenant_id, email, password_hash, role, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(UserId::generate())
        .bind(tenant_id)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(actor)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email already registered"))?;

        Ok(row.into())
    }

    /// Store the current refresh token for a user, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn store_refresh_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE app_user
             SET refresh_token = $2, refresh_token_expires_at = $3, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Look up the user holding a refresh token, together with its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<(User, DateTime<Utc>)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: UserRow,
            refresh_token_expires_at: DateTime<Utc>,
        }

        let row = sqlx::query_as::<_, Row>(&format!(
            "SELECT {USER_COLUMNS}, refresh_token_expires_at
             FROM app_user
             WHERE refresh_token = $1
               AND refresh_token_expires_at IS NOT NULL
               AND deleted_at IS NULL"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user.into(), r.refresh_token_expires_at)))
    }

    /// Revoke a user's refresh token (logout).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_refresh_token(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE app_user
             SET refresh_token = NULL, refresh_token_expires_at = NULL, updated_at = now()
             WHERE id = $1",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
