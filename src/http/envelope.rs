//! Uniform JSON response envelope
//!
//! Every response body has the shape
//! `{"success": bool, "message"?: string, "json_data"?: any, "response"?: any}`.
//! Absent fields are omitted rather than serialized as `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl Envelope {
    /// `{"success": true}`
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
            json_data: None,
            response: None,
        }
    }

    /// `{"success": true, "json_data": ...}`
    pub fn with_data(data: Value) -> Self {
        Self {
            success: true,
            message: None,
            json_data: Some(data),
            response: None,
        }
    }

    /// `{"success": true, "response": ...}`
    pub fn with_response(response: Value) -> Self {
        Self {
            success: true,
            message: None,
            json_data: None,
            response: Some(response),
        }
    }

    /// `{"success": false, "message": ...}`
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            json_data: None,
            response: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_omits_optional_fields() {
        assert_eq!(
            serde_json::to_value(Envelope::ok()).unwrap(),
            json!({"success": true})
        );
    }

    #[test]
    fn test_failure_shape() {
        assert_eq!(
            serde_json::to_value(Envelope::failure("Invalid frame type: x")).unwrap(),
            json!({"success": false, "message": "Invalid frame type: x"})
        );
    }

    #[test]
    fn test_data_and_response_shapes() {
        assert_eq!(
            serde_json::to_value(Envelope::with_data(json!([1, 2]))).unwrap(),
            json!({"success": true, "json_data": [1, 2]})
        );
        assert_eq!(
            serde_json::to_value(Envelope::with_response(json!({"a": 1}))).unwrap(),
            json!({"success": true, "response": {"a": 1}})
        );
    }

    #[test]
    fn test_null_payload_is_kept_by_value() {
        // A JSON null echoed back is still a present field
        let env = Envelope::with_response(Value::Null);
        assert_eq!(
            serde_json::to_string(&env).unwrap(),
            r#"{"success":true,"response":null}"#
        );
    }
}
