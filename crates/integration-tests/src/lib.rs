//! Shared helpers for Slotwise integration tests.
//!
//! Tests drive a running API server over HTTP. They require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p slotwise-api)
//!
//! Run with: cargo test -p slotwise-integration-tests -- --ignored

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("SLOTWISE_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string())
}

/// A registered tenant session for use in tests.
pub struct TestTenant {
    pub client: Client,
    pub access_token: String,
    pub refresh_token: String,
    pub owner_email: String,
}

impl TestTenant {
    /// Register a fresh tenant with a unique name and return its session.
    ///
    /// # Panics
    ///
    /// Panics if the server is unreachable or registration fails.
    pub async fn register() -> Self {
        let client = Client::new();
        let suffix = Uuid::new_v4().simple().to_string();
        let owner_email = format!("owner-{suffix}@test.example");

        let resp = client
            .post(format!("{}/api/v1/auth/register", base_url()))
            .json(&json!({
                "business_name": format!("Test Studio {suffix}"),
                "contact_email": owner_email,
                "owner_email": owner_email,
                "password": "integration-test-pw",
            }))
            .send()
            .await
            .expect("Failed to register tenant");

        assert!(
            resp.status().is_success(),
            "registration failed: {}",
            resp.status()
        );

        let body: Value = resp.json().await.expect("Failed to parse registration");
        assert_eq!(body["succeeded"], true);

        Self {
            client,
            access_token: body["data"]["tokens"]["access_token"]
                .as_str()
                .expect("access token")
                .to_string(),
            refresh_token: body["data"]["tokens"]["refresh_token"]
                .as_str()
                .expect("refresh token")
                .to_string(),
            owner_email,
        }
    }

    /// GET a path with the tenant's bearer token.
    pub async fn get(&self, path: &str) -> Value {
        let resp = self
            .client
            .get(format!("{}{path}", base_url()))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .expect("GET failed");
        resp.json().await.expect("Failed to parse response")
    }

    /// POST a JSON body with the tenant's bearer token, returning the
    /// response body and status.
    pub async fn post(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}{path}", base_url()))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .expect("POST failed");
        let status = resp.status();
        let body = resp.json().await.expect("Failed to parse response");
        (status, body)
    }

    /// DELETE a path with the tenant's bearer token.
    pub async fn delete(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .delete(format!("{}{path}", base_url()))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .expect("DELETE failed");
        let status = resp.status();
        let body = resp.json().await.expect("Failed to parse response");
        (status, body)
    }

    /// Create a customer and return its id.
    pub async fn create_customer(&self, first_name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/customers",
                &json!({ "first_name": first_name, "last_name": "Tester" }),
            )
            .await;
        assert!(status.is_success(), "create customer failed: {status}");
        body["data"]["id"].as_str().expect("customer id").to_string()
    }

    /// Create an employee offering a fresh 30-minute service; returns
    /// (`employee_id`, `service_id`).
    pub async fn create_employee_with_service(&self) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/v1/employees",
                &json!({ "first_name": "Emp", "last_name": "Loyee" }),
            )
            .await;
        assert!(status.is_success(), "create employee failed: {status}");
        let employee_id = body["data"]["id"].as_str().expect("employee id").to_string();

        let (status, body) = self
            .post(
                "/api/v1/services",
                &json!({
                    "name": "Haircut",
                    "duration_minutes": 30,
                    "price_amount": "45.00",
                    "price_currency": "USD",
                    "active": true,
                }),
            )
            .await;
        assert!(status.is_success(), "create service failed: {status}");
        let service_id = body["data"]["id"].as_str().expect("service id").to_string();

        let resp = self
            .client
            .put(format!(
                "{}/api/v1/employees/{employee_id}/services",
                base_url()
            ))
            .bearer_auth(&self.access_token)
            .json(&json!({ "service_ids": [service_id] }))
            .send()
            .await
            .expect("assign services failed");
        assert!(resp.status().is_success());

        (employee_id, service_id)
    }
}
