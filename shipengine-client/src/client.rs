// ShipEngine client
// Single calls, per-call configuration overrides and batches over a
// pluggable blocking HTTP backend.

use crate::batch::{BatchBuilder, BatchResults};
use crate::interpret::{interpret, interpret_batch};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shipengine_core::{
    BatchRequest, ConfigOptions, Result, RpcRequest, ShipEngineConfig, ShipEngineError,
};
use shipengine_transport::{HttpBackend, ReqwestBackend, TransportClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Entry point for talking to the ShipEngine API.
///
/// The validated configuration is immutable and shared; a client is
/// `Send + Sync` whenever its backend is.
#[derive(Debug, Clone)]
pub struct ShipEngine<B = ReqwestBackend> {
    config: Arc<ShipEngineConfig>,
    transport: TransportClient<B>,
}

impl ShipEngine<ReqwestBackend> {
    /// Validate `options` and build a client over the default HTTP backend.
    pub fn new(options: ConfigOptions) -> Result<Self> {
        let config = ShipEngineConfig::new(options)?;
        let backend = ReqwestBackend::new().map_err(|e| ShipEngineError::transport(0, e))?;
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(ConfigOptions::new().api_key(api_key))
    }
}

impl<B: HttpBackend> ShipEngine<B> {
    pub fn with_backend(config: ShipEngineConfig, backend: B) -> Self {
        ShipEngine {
            config: Arc::new(config),
            transport: TransportClient::new(backend),
        }
    }

    /// Replace how the client waits between rate-limit retries.
    pub fn with_sleeper(mut self, sleeper: fn(Duration)) -> Self {
        self.transport = self.transport.with_sleeper(sleeper);
        self
    }

    pub fn config(&self) -> &ShipEngineConfig {
        &self.config
    }

    pub fn transport(&self) -> &TransportClient<B> {
        &self.transport
    }

    /// Call `method` and return its raw result.
    pub fn call(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        self.execute(&RpcRequest::new(method, params), &self.config)
    }

    /// Call `method` and decode its result into `T`.
    pub fn call_as<T: DeserializeOwned>(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Result<T> {
        let request = RpcRequest::new(method, params);
        let value = self.execute(&request, &self.config)?;
        serde_json::from_value(value).map_err(|e| {
            ShipEngineError::protocol(format!(
                "Unable to decode the result of {}: {}",
                request.method(),
                e
            ))
            .with_request_id(Some(request.id().clone()))
        })
    }

    /// Call `method` with `overrides` merged onto the client configuration.
    ///
    /// Invalid overrides fail before anything is sent.
    pub fn call_with(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        overrides: &ConfigOptions,
    ) -> Result<Value> {
        let config = self.config.merge(overrides)?;
        self.execute(&RpcRequest::new(method, params), &config)
    }

    /// Start a batch of independent calls.
    pub fn batch(&self) -> BatchBuilder<'_, B> {
        BatchBuilder::new(self)
    }

    pub(crate) fn send_batch(&self, batch: &BatchRequest) -> Result<BatchResults> {
        debug!(requests = batch.len(), "Sending batch");
        let response = self.transport.send(&batch.to_bytes()?, &self.config)?;
        interpret_batch(&response, batch)
    }

    fn execute(&self, request: &RpcRequest, config: &ShipEngineConfig) -> Result<Value> {
        debug!(method = request.method(), request_id = %request.id(), "Calling");
        let response = self.transport.send(&request.to_bytes()?, config)?;
        interpret(&response)
    }
}
