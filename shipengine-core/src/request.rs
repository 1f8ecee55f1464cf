use crate::error::{ErrorCode, Result, ShipEngineError};
use crate::ids::RequestId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// A single JSON-RPC 2.0 request envelope.
///
/// `params` is left out of the wire form entirely when there are none, so
/// minimal JSON-RPC servers that reject `"params": null` still accept it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    id: RequestId,
    jsonrpc: String,
    method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl RpcRequest {
    /// Build a request with a freshly generated id. A `null` payload counts
    /// as no payload.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        RpcRequest {
            id: RequestId::generate(),
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: params.filter(|value| !value.is_null()),
        }
    }

    /// Build a request from any serializable payload.
    pub fn with_params<T: Serialize + ?Sized>(
        method: impl Into<String>,
        params: &T,
    ) -> Result<Self> {
        let method = method.into();
        let value = serde_json::to_value(params).map_err(|e| {
            ShipEngineError::validation(
                format!("Unable to serialize params for {}: {}", method, e),
                ErrorCode::InvalidFieldValue,
            )
        })?;
        Ok(Self::new(method, Some(value)))
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn jsonrpc(&self) -> &str {
        &self.jsonrpc
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// An ordered list of independent requests sent as one JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchRequest {
    requests: Vec<RpcRequest>,
}

impl BatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one request per `(method, params)` pair, keeping their order.
    pub fn from_calls<I, M>(calls: I) -> Self
    where
        I: IntoIterator<Item = (M, Option<Value>)>,
        M: Into<String>,
    {
        BatchRequest {
            requests: calls
                .into_iter()
                .map(|(method, params)| RpcRequest::new(method, params))
                .collect(),
        }
    }

    /// Append a request and return its id.
    pub fn push(&mut self, method: impl Into<String>, params: Option<Value>) -> RequestId {
        self.push_request(RpcRequest::new(method, params))
    }

    pub fn push_request(&mut self, request: RpcRequest) -> RequestId {
        let id = request.id().clone();
        self.requests.push(request);
        id
    }

    pub fn ids(&self) -> Vec<&RequestId> {
        self.requests.iter().map(RpcRequest::id).collect()
    }

    pub fn requests(&self) -> &[RpcRequest] {
        &self.requests
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RpcRequest> {
        self.requests.iter()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

impl<'a> IntoIterator for &'a BatchRequest {
    type Item = &'a RpcRequest;
    type IntoIter = std::slice::Iter<'a, RpcRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}
