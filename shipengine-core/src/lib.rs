// ShipEngine Core
// JSON-RPC 2.0 envelopes, validated configuration and the closed error
// taxonomy shared by the transport and client crates.

#[macro_use]
mod macros;

pub mod config;
pub mod error;
pub mod ids;
pub mod method;
pub mod request;
pub mod response;
pub mod timestamp;

pub use config::{ConfigOptions, ShipEngineConfig, DEFAULT_BASE_URI};
pub use error::{ErrorCode, ErrorKind, ErrorSource, ErrorType, Result, ShipEngineError};
pub use ids::RequestId;
pub use method::RpcMethod;
pub use request::{BatchRequest, RpcRequest, JSONRPC_VERSION};
pub use response::{ErrorData, ErrorPayload, Outcome, RpcResponse};
pub use timestamp::IsoTimestamp;
