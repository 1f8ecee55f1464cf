use crate::batch::BatchResults;
use serde_json::Value;
use shipengine_core::{
    BatchRequest, ErrorCode, ErrorKind, ErrorPayload, ErrorSource, ErrorType, Outcome, RequestId,
    Result, RpcResponse, ShipEngineError,
};
use shipengine_transport::HttpResponse;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Turn one HTTP response into the call's result or a typed error.
pub fn interpret(response: &HttpResponse) -> Result<Value> {
    check_status(response)?;
    let envelope = decode_envelope(decode(&response.body)?)?;
    interpret_envelope(envelope)
}

/// Apply the exactly-one-of rule and dispatch server errors.
pub fn interpret_envelope(envelope: RpcResponse) -> Result<Value> {
    let id = envelope.id.clone();
    match envelope.into_outcome() {
        Ok(Outcome::Success(result)) => Ok(result),
        Ok(Outcome::Failure(payload)) => Err(dispatch_error(payload, id)),
        Err(err) => {
            warn!(request_id = ?id, error = %err, "Malformed response envelope");
            Err(err)
        }
    }
}

/// Map a server-declared error onto the error kind selected by its `error_type`.
///
/// Message, codes, source and url are carried over as sent.
pub fn dispatch_error(payload: ErrorPayload, request_id: Option<RequestId>) -> ShipEngineError {
    let Some(data) = payload.data else {
        return ShipEngineError::new(
            ErrorKind::Unspecified,
            payload.message,
            ErrorSource::ShipEngine,
            ErrorType::System,
            ErrorCode::Unspecified,
        )
        .with_request_id(request_id);
    };

    let kind = data
        .error_type
        .as_ref()
        .map(ErrorKind::from_error_type)
        .unwrap_or(ErrorKind::Unspecified);

    let mut err = ShipEngineError::new(
        kind,
        payload.message,
        data.error_source,
        data.error_type.unwrap_or(ErrorType::System),
        data.error_code,
    )
    .with_request_id(request_id);
    err.url = data.url;
    err
}

/// Interpret the response to a batch, correlating elements by request id.
///
/// Anything that prevents reading the array (bad status, bad JSON, a single
/// error envelope in place of the array) fails the whole batch. Past that
/// point each element succeeds or fails on its own.
pub fn interpret_batch(response: &HttpResponse, batch: &BatchRequest) -> Result<BatchResults> {
    check_status(response)?;

    let elements = match decode(&response.body)? {
        Value::Array(elements) => elements,
        other => {
            let envelope = decode_envelope(other)?;
            let id = envelope.id.clone();
            return Err(match envelope.into_outcome()? {
                Outcome::Failure(payload) => dispatch_error(payload, id),
                Outcome::Success(_) => ShipEngineError::protocol(
                    "Invalid JSON-RPC batch response: expected an array of responses",
                )
                .with_request_id(id),
            });
        }
    };

    let mut by_id: HashMap<RequestId, Result<Value>> = HashMap::with_capacity(elements.len());
    for element in elements {
        let Some(id) = raw_id(&element) else {
            warn!("Skipping batch element without an id");
            continue;
        };
        if by_id.contains_key(&id) {
            warn!(request_id = %id, "Ignoring duplicate response in batch");
            continue;
        }
        let outcome = decode_envelope(element).and_then(interpret_envelope);
        by_id.insert(id, outcome);
    }

    let mut entries = Vec::with_capacity(batch.len());
    for request in batch {
        let id = request.id();
        let outcome = by_id.remove(id).unwrap_or_else(|| {
            Err(ShipEngineError::protocol(format!(
                "No response was received for request {}",
                id
            ))
            .with_request_id(Some(id.clone())))
        });
        entries.push((id.clone(), outcome));
    }

    for id in by_id.keys() {
        warn!(request_id = %id, "Batch response for an unknown request");
    }

    Ok(BatchResults::from_entries(entries))
}

fn check_status(response: &HttpResponse) -> Result<()> {
    if response.status.as_u16() == 200 {
        return Ok(());
    }
    warn!(status = response.status.as_u16(), "Unexpected HTTP status");
    Err(ShipEngineError::transport(
        response.status.as_u16(),
        response.reason(),
    ))
}

fn decode(body: &[u8]) -> Result<Value> {
    trace!(body = %String::from_utf8_lossy(body), "Response body");
    serde_json::from_slice(body).map_err(invalid_response)
}

/// Typed decode of one envelope; on failure the error still names the id
/// when the raw value carries one.
fn decode_envelope(value: Value) -> Result<RpcResponse> {
    let id = raw_id(&value);
    serde_json::from_value(value).map_err(|e| invalid_response(e).with_request_id(id))
}

fn raw_id(value: &Value) -> Option<RequestId> {
    value.get("id").and_then(Value::as_str).map(RequestId::from)
}

fn invalid_response(err: serde_json::Error) -> ShipEngineError {
    warn!(error = %err, "Undecodable response body");
    ShipEngineError::protocol(format!("Invalid JSON-RPC response: {}", err))
}
