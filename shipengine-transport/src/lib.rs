// ShipEngine Transport
// Blocking HTTP delivery of JSON-RPC bodies: authentication headers, endpoint
// resolution and recovery from HTTP 429 rate limiting.

pub mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
#[cfg(feature = "reqwest-backend")]
pub mod reqwest_backend;
pub mod transport;

pub use client::{resolve_base_uri, TransportClient, BASE_URI_ENV_VAR, DEFAULT_RETRY_AFTER};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockBackend;
#[cfg(feature = "reqwest-backend")]
pub use reqwest_backend::ReqwestBackend;
pub use transport::{HttpBackend, HttpRequest, HttpResponse, TransportError};
