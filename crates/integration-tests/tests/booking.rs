//! End-to-end booking flow tests.
//!
//! These tests require a running `PostgreSQL` database with migrations
//! applied and the API server running.
//!
//! Run with: cargo test -p slotwise-integration-tests -- --ignored

use chrono::{Duration, Utc};
use serde_json::json;

use slotwise_integration_tests::TestTenant;

/// A start time on a weekday comfortably inside the default booking window.
fn slot(hour: u32, minute: u32) -> String {
    let mut day = (Utc::now() + Duration::days(2)).date_naive();
    // Default business hours are Monday-Friday
    while matches!(
        day.format("%a").to_string().as_str(),
        "Sat" | "Sun"
    ) {
        day = day + Duration::days(1);
    }
    format!("{day}T{hour:02}:{minute:02}:00Z")
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_overlapping_booking_is_rejected() {
    let tenant = TestTenant::register().await;
    let customer_id = tenant.create_customer("Julia").await;
    let (employee_id, service_id) = tenant.create_employee_with_service().await;

    // Book 10:00-10:30
    let (status, body) = tenant
        .post(
            "/api/v1/appointments",
            &json!({
                "customer_id": customer_id,
                "employee_id": employee_id,
                "service_id": service_id,
                "start_time": slot(10, 0),
            }),
        )
        .await;
    assert!(status.is_success(), "first booking failed: {body}");

    // 10:15 overlaps and must be rejected with the business-rule message
    let (status, body) = tenant
        .post(
            "/api/v1/appointments",
            &json!({
                "customer_id": customer_id,
                "employee_id": employee_id,
                "service_id": service_id,
                "start_time": slot(10, 15),
            }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["succeeded"], false);
    assert_eq!(body["errors"][0], "Selected time slot is not available");

    // 10:30 starts exactly when the first booking ends and must succeed
    let (status, body) = tenant
        .post(
            "/api/v1/appointments",
            &json!({
                "customer_id": customer_id,
                "employee_id": employee_id,
                "service_id": service_id,
                "start_time": slot(10, 30),
            }),
        )
        .await;
    assert!(status.is_success(), "back-to-back booking failed: {body}");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cancel_follows_state_machine() {
    let tenant = TestTenant::register().await;
    let customer_id = tenant.create_customer("Julia").await;
    let (employee_id, service_id) = tenant.create_employee_with_service().await;

    let (status, body) = tenant
        .post(
            "/api/v1/appointments",
            &json!({
                "customer_id": customer_id,
                "employee_id": employee_id,
                "service_id": service_id,
                "start_time": slot(11, 0),
            }),
        )
        .await;
    assert!(status.is_success());
    let id = body["data"]["id"].as_str().expect("appointment id").to_string();

    // Scheduled -> Confirmed -> InProgress -> Completed
    for step in ["confirm", "start", "complete"] {
        let (status, body) = tenant
            .post(&format!("/api/v1/appointments/{id}/{step}"), &json!({}))
            .await;
        assert!(status.is_success(), "{step} failed: {body}");
    }

    // A completed appointment rejects cancellation
    let (status, body) = tenant
        .post(&format!("/api/v1/appointments/{id}/cancel"), &json!({}))
        .await;
    assert_eq!(status, reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["succeeded"], false);

    // A fresh scheduled appointment cancels fine
    let (status, body) = tenant
        .post(
            "/api/v1/appointments",
            &json!({
                "customer_id": customer_id,
                "employee_id": employee_id,
                "service_id": service_id,
                "start_time": slot(12, 0),
            }),
        )
        .await;
    assert!(status.is_success());
    let id = body["data"]["id"].as_str().expect("appointment id").to_string();

    let (status, body) = tenant
        .post(&format!("/api/v1/appointments/{id}/cancel"), &json!({}))
        .await;
    assert!(status.is_success());
    assert_eq!(body["data"]["status"], "canceled");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_soft_deleted_customer_keeps_history() {
    let tenant = TestTenant::register().await;
    let customer_id = tenant.create_customer("Ghost").await;
    let (employee_id, service_id) = tenant.create_employee_with_service().await;

    let (status, body) = tenant
        .post(
            "/api/v1/appointments",
            &json!({
                "customer_id": customer_id,
                "employee_id": employee_id,
                "service_id": service_id,
                "start_time": slot(9, 0),
            }),
        )
        .await;
    assert!(status.is_success());
    let appointment_id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, _) = tenant.delete(&format!("/api/v1/customers/{customer_id}")).await;
    assert!(status.is_success());

    // Customer is gone from listings...
    let list = tenant.get("/api/v1/customers?refresh=true").await;
    let items = list["data"]["items"].as_array().expect("items");
    assert!(
        items
            .iter()
            .all(|c| c["id"].as_str() != Some(customer_id.as_str())),
        "soft-deleted customer still listed"
    );

    // ...but their appointment still resolves
    let detail = tenant
        .get(&format!("/api/v1/appointments/{appointment_id}"))
        .await;
    assert_eq!(detail["succeeded"], true);
    assert_eq!(
        detail["data"]["customer_id"].as_str(),
        Some(customer_id.as_str())
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_available_slots_exclude_booked() {
    let tenant = TestTenant::register().await;
    let customer_id = tenant.create_customer("Julia").await;
    let (employee_id, service_id) = tenant.create_employee_with_service().await;

    let start = slot(10, 0);
    let date = start.split('T').next().expect("date part").to_string();

    let (status, _) = tenant
        .post(
            "/api/v1/appointments",
            &json!({
                "customer_id": customer_id,
                "employee_id": employee_id,
                "service_id": service_id,
                "start_time": start,
            }),
        )
        .await;
    assert!(status.is_success());

    let slots = tenant
        .get(&format!(
            "/api/v1/appointments/slots?employee_id={employee_id}&service_id={service_id}&date={date}"
        ))
        .await;
    assert_eq!(slots["succeeded"], true);

    let slot_list = slots["data"].as_array().expect("slots array");
    assert!(
        !slot_list.iter().any(|s| s.as_str() == Some(start.as_str())),
        "booked slot still offered"
    );
}
