//! Tenant management commands.

use slotwise_core::Email;

use slotwise_api::db::TenantRepository;
use slotwise_api::db::tenants::NewTenantRegistration;
use slotwise_api::services::auth::{hash_password, validate_password};

use super::{CommandError, connect};

/// Register a tenant with an owner account.
///
/// # Errors
///
/// Returns `CommandError` for invalid input, a taken slug/email, or
/// database failures.
pub async fn create(
    name: &str,
    owner_email: &str,
    password: &str,
    timezone: &str,
) -> Result<(), CommandError> {
    let email =
        Email::parse(owner_email).map_err(|e| CommandError::InvalidInput(e.to_string()))?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let slug = slugify(name);
    if slug.is_empty() {
        return Err(CommandError::InvalidInput(
            "business name must contain letters or digits".to_string(),
        ));
    }

    let pool = connect().await?;

    let (tenant, owner) = TenantRepository::new(&pool)
        .register(NewTenantRegistration {
            tenant_name: name,
            slug: &slug,
            contact_email: &email,
            timezone,
            owner_email: &email,
            owner_password_hash: &password_hash,
        })
        .await?;

    tracing::info!(
        tenant = %tenant.id,
        slug = %tenant.slug,
        owner = %owner.email,
        "tenant created"
    );
    Ok(())
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
