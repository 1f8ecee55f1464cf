use crate::transport::{HttpBackend, HttpRequest, HttpResponse, TransportError};
use shipengine_core::config::MAX_TIMEOUT;
use std::time::Duration;

/// [`HttpBackend`] over a pooled `reqwest` blocking client.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::blocking::Client,
}

impl ReqwestBackend {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Wrap an already configured client (proxies, custom roots, ...).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        ReqwestBackend { client }
    }
}

impl HttpBackend for ReqwestBackend {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        // reqwest adds the timeout to `Instant::now()`
        let timeout = request.timeout.min(MAX_TIMEOUT);
        let response = self
            .client
            .post(&request.url)
            .headers(request.headers.clone())
            .timeout(timeout)
            .body(request.body.clone())
            .send()
            .map_err(|e| map_error(e, timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().map_err(|e| map_error(e, timeout))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else if err.is_decode() || err.is_body() {
        TransportError::Protocol(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
