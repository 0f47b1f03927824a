//! Seed the database with a demo tenant.
//!
//! Creates "Glow Beauty Studio" with an owner login, two employees, two
//! services, and one upcoming appointment. Intended for local development.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use slotwise_core::{CurrencyCode, Email, Price};

use slotwise_api::db::appointments::NewAppointment;
use slotwise_api::db::customers::NewCustomer;
use slotwise_api::db::employees::NewEmployee;
use slotwise_api::db::services::NewService;
use slotwise_api::db::tenants::NewTenantRegistration;
use slotwise_api::db::{
    AppointmentRepository, CustomerRepository, EmployeeRepository, ServiceRepository,
    TenantRepository,
};
use slotwise_api::services::auth::hash_password;

use super::{CommandError, connect};

const OWNER_EMAIL: &str = "owner@glow.example";
const OWNER_PASSWORD: &str = "demo-password";

/// Create the demo tenant and its fixtures.
///
/// # Errors
///
/// Returns `CommandError` if any insert fails (including when the demo
/// tenant already exists).
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let owner_email =
        Email::parse(OWNER_EMAIL).map_err(|e| CommandError::InvalidInput(e.to_string()))?;
    let password_hash = hash_password(OWNER_PASSWORD)?;

    let (tenant, owner) = TenantRepository::new(&pool)
        .register(NewTenantRegistration {
            tenant_name: "Glow Beauty Studio",
            slug: "glow-beauty-studio",
            contact_email: &owner_email,
            timezone: "UTC",
            owner_email: &owner_email,
            owner_password_hash: &password_hash,
        })
        .await?;

    tracing::info!(tenant = %tenant.id, "demo tenant created");

    let employees = EmployeeRepository::new(&pool);
    let anna = employees
        .insert(NewEmployee {
            tenant_id: tenant.id,
            first_name: "Anna",
            last_name: "Kowalska",
            email: Some("anna@glow.example"),
            phone: None,
            title: Some("Senior Stylist"),
            actor: Some(owner.id),
        })
        .await?;
    let marek = employees
        .insert(NewEmployee {
            tenant_id: tenant.id,
            first_name: "Marek",
            last_name: "Nowak",
            email: Some("marek@glow.example"),
            phone: None,
            title: Some("Barber"),
            actor: Some(owner.id),
        })
        .await?;

    let services = ServiceRepository::new(&pool);
    let haircut = services
        .insert(NewService {
            tenant_id: tenant.id,
            name: "Haircut",
            description: Some("Wash, cut, and style"),
            duration_minutes: 30,
            price: Price::new(Decimal::new(4500, 2), CurrencyCode::Usd),
            active: true,
            actor: Some(owner.id),
        })
        .await?;
    let coloring = services
        .insert(NewService {
            tenant_id: tenant.id,
            name: "Coloring",
            description: Some("Full color treatment"),
            duration_minutes: 90,
            price: Price::new(Decimal::new(12_000, 2), CurrencyCode::Usd),
            active: true,
            actor: Some(owner.id),
        })
        .await?;

    employees
        .replace_services(anna.id, &[haircut.id, coloring.id])
        .await?;
    employees.replace_services(marek.id, &[haircut.id]).await?;

    let customer = CustomerRepository::new(&pool)
        .insert(NewCustomer {
            tenant_id: tenant.id,
            first_name: "Julia",
            last_name: "Wisniewska",
            email: Some("julia@example.com"),
            phone: Some("+48 600 000 000"),
            notes: None,
            actor: Some(owner.id),
        })
        .await?;

    // One upcoming appointment tomorrow at 10:00
    let start = (Utc::now() + Duration::days(1))
        .date_naive()
        .and_hms_opt(10, 0, 0)
        .map_or_else(Utc::now, |t| t.and_utc());

    let appointment = AppointmentRepository::new(&pool)
        .create_if_available(NewAppointment {
            tenant_id: tenant.id,
            customer_id: customer.id,
            employee_id: anna.id,
            service_id: haircut.id,
            start_time: start,
            end_time: start + Duration::minutes(30),
            notes: Some("Demo booking"),
            actor: Some(owner.id),
        })
        .await?;

    match appointment {
        Some(a) => tracing::info!(appointment = %a.id, "demo appointment booked"),
        None => tracing::warn!("demo slot was already taken, skipping appointment"),
    }

    tracing::info!(
        "seed complete; login with {OWNER_EMAIL} / {OWNER_PASSWORD}"
    );
    Ok(())
}
