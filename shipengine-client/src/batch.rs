use crate::client::ShipEngine;
use serde::Serialize;
use serde_json::Value;
use shipengine_core::{BatchRequest, ErrorCode, RequestId, Result, RpcRequest, ShipEngineError};
use shipengine_transport::HttpBackend;

/// Collects independent calls and sends them as one JSON-RPC batch.
#[derive(Debug)]
pub struct BatchBuilder<'a, B> {
    client: &'a ShipEngine<B>,
    request: BatchRequest,
}

/// Handle for the result of one call in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingCall {
    id: RequestId,
    index: usize,
}

impl PendingCall {
    pub fn id(&self) -> &RequestId {
        &self.id
    }
}

impl<'a, B: HttpBackend> BatchBuilder<'a, B> {
    pub(crate) fn new(client: &'a ShipEngine<B>) -> Self {
        BatchBuilder {
            client,
            request: BatchRequest::new(),
        }
    }

    /// Add a call to the batch
    pub fn call(&mut self, method: impl Into<String>, params: Option<Value>) -> PendingCall {
        self.push(RpcRequest::new(method, params))
    }

    /// Add a call whose params are any serializable value
    pub fn call_with_params<T: Serialize + ?Sized>(
        &mut self,
        method: impl Into<String>,
        params: &T,
    ) -> Result<PendingCall> {
        Ok(self.push(RpcRequest::with_params(method, params)?))
    }

    fn push(&mut self, request: RpcRequest) -> PendingCall {
        let index = self.request.len();
        let id = self.request.push_request(request);
        PendingCall { id, index }
    }

    pub fn len(&self) -> usize {
        self.request.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty()
    }

    /// Send every queued call in one HTTP exchange.
    pub fn execute(self) -> Result<BatchResults> {
        if self.request.is_empty() {
            return Err(ShipEngineError::validation(
                "A batch must contain at least one request.",
                ErrorCode::InvalidFieldValue,
            ));
        }
        self.client.send_batch(&self.request)
    }
}

/// Per-call outcomes of a batch, in the order the calls were added.
#[derive(Debug, Clone)]
pub struct BatchResults {
    entries: Vec<(RequestId, Result<Value>)>,
}

impl BatchResults {
    pub(crate) fn from_entries(entries: Vec<(RequestId, Result<Value>)>) -> Self {
        BatchResults { entries }
    }

    /// Get the outcome of a pending call
    pub fn get(&self, pending: &PendingCall) -> Result<Value> {
        match self.entries.get(pending.index) {
            Some((id, outcome)) if id == &pending.id => outcome.clone(),
            _ => Err(ShipEngineError::protocol(format!(
                "Request {} is not part of this batch",
                pending.id
            ))
            .with_request_id(Some(pending.id.clone()))),
        }
    }

    pub fn get_by_id(&self, id: &RequestId) -> Option<&Result<Value>> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, outcome)| outcome)
    }

    pub fn contains(&self, pending: &PendingCall) -> bool {
        self.get_by_id(&pending.id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RequestId, &Result<Value>)> {
        self.entries.iter().map(|(id, outcome)| (id, outcome))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outcomes in call order.
    pub fn into_results(self) -> Vec<Result<Value>> {
        self.entries.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
