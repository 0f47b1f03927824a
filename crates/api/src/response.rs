//! Uniform JSON envelope returned by every endpoint.

use serde::{Deserialize, Serialize};

/// Response envelope: `{ succeeded, data, errors, message }`.
///
/// Success and failure share the shape so clients branch on `succeeded`
/// without inspecting the HTTP status first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying a payload.
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self {
            succeeded: true,
            data: Some(data),
            errors: Vec::new(),
            message: None,
        }
    }

    /// Successful response with a payload and a human-readable message.
    #[must_use]
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            data: Some(data),
            errors: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// Failed response carrying error messages.
    #[must_use]
    pub fn failure(errors: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            data: None,
            errors,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let body = serde_json::to_value(ApiResponse::success(5)).unwrap();
        assert_eq!(body["succeeded"], true);
        assert_eq!(body["data"], 5);
        assert_eq!(body["errors"], serde_json::json!([]));
        assert!(body.get("message").is_none());
    }

    #[test]
    fn test_failure_shape() {
        let body = serde_json::to_value(ApiResponse::<()>::failure(
            vec!["first_name: required".into()],
            "Validation failed",
        ))
        .unwrap();
        assert_eq!(body["succeeded"], false);
        assert!(body.get("data").is_none());
        assert_eq!(body["errors"][0], "first_name: required");
        assert_eq!(body["message"], "Validation failed");
    }
}
