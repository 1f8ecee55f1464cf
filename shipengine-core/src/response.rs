use crate::error::{ErrorCode, ErrorSource, ErrorType, Result, ShipEngineError};
use crate::ids::RequestId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A JSON-RPC 2.0 response envelope as received.
///
/// A well-formed envelope carries exactly one of `result` or `error`. A
/// `"result": null` member counts as present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// What a well-formed envelope carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(ErrorPayload),
}

impl RpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        RpcResponse {
            id: Some(id),
            jsonrpc: crate::request::JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<RequestId>, error: ErrorPayload) -> Self {
        RpcResponse {
            id,
            jsonrpc: crate::request::JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
        }
    }

    /// Check the exactly-one-of rule and hand back what the envelope carries.
    pub fn into_outcome(self) -> Result<Outcome> {
        match (self.result, self.error) {
            (Some(result), None) => Ok(Outcome::Success(result)),
            (None, Some(error)) => Ok(Outcome::Failure(error)),
            (Some(_), Some(_)) => Err(ShipEngineError::protocol(
                "Invalid JSON-RPC response: both result and error are present",
            )
            .with_request_id(self.id)),
            (None, None) => Err(ShipEngineError::protocol(
                "Invalid JSON-RPC response: neither result nor error is present",
            )
            .with_request_id(self.id)),
        }
    }
}

/// The `error` member of a response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

/// ShipEngine's structured error details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub error_source: ErrorSource,
    /// `None` when the server declared no type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    #[serde(default)]
    pub error_code: ErrorCode,
    /// Milliseconds to wait before retrying; rate limit errors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let response: RpcResponse = serde_json::from_value(json!({
            "id": "req_1",
            "jsonrpc": "2.0",
            "result": {"status": "verified"}
        }))
        .unwrap();
        assert_eq!(response.id, Some(RequestId::new("req_1")));
        assert_eq!(
            response.into_outcome().unwrap(),
            Outcome::Success(json!({"status": "verified"}))
        );
    }

    #[test]
    fn test_null_result_is_present() {
        let response: RpcResponse =
            serde_json::from_value(json!({"id": "req_1", "jsonrpc": "2.0", "result": null}))
                .unwrap();
        assert_eq!(response.into_outcome().unwrap(), Outcome::Success(Value::Null));
    }

    #[test]
    fn test_error_envelope() {
        let response: RpcResponse = serde_json::from_value(json!({
            "id": "req_2",
            "jsonrpc": "2.0",
            "error": {
                "code": -32602,
                "message": "Invalid country code",
                "data": {
                    "error_source": "shipengine",
                    "error_type": "validation",
                    "error_code": "invalid_field_value"
                }
            }
        }))
        .unwrap();

        match response.into_outcome().unwrap() {
            Outcome::Failure(error) => {
                let data = error.data.unwrap();
                assert_eq!(error.code, -32602);
                assert_eq!(data.error_type, Some(ErrorType::Validation));
                assert_eq!(data.error_code, ErrorCode::InvalidFieldValue);
                assert_eq!(data.retry_after, None);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_error_with_null_id() {
        let response: RpcResponse = serde_json::from_value(json!({
            "id": null,
            "jsonrpc": "2.0",
            "error": {"code": -32700, "message": "Parse error"}
        }))
        .unwrap();
        assert_eq!(response.id, None);
        assert!(matches!(response.into_outcome(), Ok(Outcome::Failure(_))));
    }

    #[test]
    fn test_both_or_neither_is_protocol_error() {
        let both: RpcResponse = serde_json::from_value(json!({
            "id": "req_3",
            "jsonrpc": "2.0",
            "result": {},
            "error": {"code": 1, "message": "x"}
        }))
        .unwrap();
        let err = both.into_outcome().unwrap_err();
        assert_eq!(err.error_code, ErrorCode::Unspecified);
        assert_eq!(err.request_id, Some(RequestId::new("req_3")));

        let neither: RpcResponse =
            serde_json::from_value(json!({"id": "req_4", "jsonrpc": "2.0"})).unwrap();
        assert!(neither.into_outcome().is_err());
    }
}
