//! API response envelope.
//!
//! Every handler responds with the same wrapper so dashboard clients can
//! branch on `success` without inspecting status codes.

use serde::{Deserialize, Serialize};

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    /// Successful response without a payload.
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    /// Failed response with an optional list of detail messages.
    pub fn failure(message: impl Into<String>, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let response = ApiResponse::ok("Rule created", serde_json::json!({"id": 1}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"message\":\"Rule created\""));
        assert!(json.contains("\"data\":{\"id\":1}"));
        assert!(!json.contains("\"errors\""));
    }

    #[test]
    fn test_ok_message_skips_data() {
        let response: ApiResponse<()> = ApiResponse::ok_message("Deleted");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"data\""));
        assert!(!json.contains("\"errors\""));
    }

    #[test]
    fn test_failure_envelope_with_errors() {
        let response: ApiResponse<()> = ApiResponse::failure(
            "Validation failed",
            Some(vec!["name: Name must not be blank".to_string()]),
        );
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"errors\":[\"name: Name must not be blank\"]"));
        assert!(!json.contains("\"data\""));
    }
}
