// ShipEngine Client
// Blocking JSON-RPC client for the ShipEngine API: typed errors, batches,
// per-call configuration overrides and automatic rate-limit retries.

pub mod batch;
pub mod cache;
pub mod client;
pub mod interpret;
pub mod logging;

pub use batch::{BatchBuilder, BatchResults, PendingCall};
pub use cache::CarrierAccountCache;
pub use client::ShipEngine;
pub use interpret::{dispatch_error, interpret, interpret_batch, interpret_envelope};

pub use shipengine_core::{
    ConfigOptions, ErrorCode, ErrorKind, ErrorSource, ErrorType, IsoTimestamp, RequestId,
    Result, RpcMethod, ShipEngineConfig, ShipEngineError,
};
pub use shipengine_transport::{HttpBackend, HttpResponse, TransportClient};
