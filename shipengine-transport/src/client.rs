use crate::transport::{HttpBackend, HttpRequest, HttpResponse, TransportError};
use bytes::Bytes;
use http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, RETRY_AFTER, USER_AGENT,
};
use http::StatusCode;
use shipengine_core::config::is_absolute_uri;
use shipengine_core::{ErrorCode, Result, RpcResponse, ShipEngineConfig, ShipEngineError};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Environment variable that redirects every request to another endpoint.
pub const BASE_URI_ENV_VAR: &str = "SHIPENGINE_BASE_URI";

/// Wait used when a 429 carries no hint at all.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

const API_KEY: &str = "api-key";

/// Sends request bodies to the API and recovers from rate limiting.
///
/// One `send` is one logical call: the same body is re-posted after each
/// HTTP 429 until the configured retry allowance is spent.
#[derive(Debug, Clone)]
pub struct TransportClient<B> {
    backend: B,
    sleeper: fn(Duration),
    user_agent: String,
}

impl<B: HttpBackend> TransportClient<B> {
    pub fn new(backend: B) -> Self {
        TransportClient {
            backend,
            sleeper: std::thread::sleep,
            user_agent: default_user_agent(),
        }
    }

    /// Replace the function used to wait between retries.
    pub fn with_sleeper(mut self, sleeper: fn(Duration)) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// POST `body` and return the first non-429 response.
    ///
    /// Non-200 statuses other than 429 are handed back untouched; turning them
    /// into errors is the interpreter's job.
    pub fn send(&self, body: &Bytes, config: &ShipEngineConfig) -> Result<HttpResponse> {
        let request = self.prepare(body, config)?;
        let mut retries_used = 0;

        loop {
            debug!(
                url = %request.url,
                bytes = request.body.len(),
                attempt = retries_used + 1,
                "Sending request"
            );
            trace!(body = %String::from_utf8_lossy(&request.body), "Request body");

            let response = self
                .backend
                .execute(&request)
                .map_err(|e| backend_failure(e, config))?;

            debug!(status = response.status.as_u16(), "Received response");
            if response.status != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let details = serde_json::from_slice::<RpcResponse>(&response.body).ok();
            let wait = retry_hint(&response, details.as_ref());

            if retries_used >= config.retries() {
                warn!(retries = retries_used, "Rate limit persisted after all retries");
                return Err(rate_limit_error(wait, details));
            }
            if wait > config.timeout() {
                warn!(
                    wait_ms = wait.as_millis() as u64,
                    timeout_ms = config.timeout().as_millis() as u64,
                    "Rate limit wait exceeds timeout"
                );
                return Err(ShipEngineError::timeout(config.timeout())
                    .with_request_id(details.and_then(|d| d.id)));
            }

            retries_used += 1;
            warn!(
                retry = retries_used,
                max_retries = config.retries(),
                wait_ms = wait.as_millis() as u64,
                "Rate limited, retrying"
            );
            (self.sleeper)(wait);
        }
    }

    fn prepare(&self, body: &Bytes, config: &ShipEngineConfig) -> Result<HttpRequest> {
        let mut api_key = HeaderValue::from_str(config.api_key()).map_err(|_| {
            ShipEngineError::validation(
                "api_key contains characters that cannot be sent in an HTTP header.",
                ErrorCode::InvalidFieldValue,
            )
        })?;
        api_key.set_sensitive(true);

        let user_agent = HeaderValue::from_str(&self.user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("shipengine-rust"));

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY), api_key);
        headers.insert(USER_AGENT, user_agent);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(HttpRequest {
            url: resolve_base_uri(config, std::env::var(BASE_URI_ENV_VAR).ok()),
            headers,
            body: body.clone(),
            timeout: config.timeout(),
        })
    }
}

/// Pick the endpoint: a non-empty absolute override wins over the config.
pub fn resolve_base_uri(config: &ShipEngineConfig, env_override: Option<String>) -> String {
    match env_override.map(|value| value.trim().to_string()) {
        Some(value) if value.is_empty() => config.base_uri().to_string(),
        Some(value) if is_absolute_uri(&value) => value,
        Some(value) => {
            warn!(
                value = %value,
                "Ignoring {} that is not an absolute http(s) URI",
                BASE_URI_ENV_VAR
            );
            config.base_uri().to_string()
        }
        None => config.base_uri().to_string(),
    }
}

/// Version of the compiler that built this crate, captured by `build.rs`.
pub const RUSTC_VERSION: &str = env!("SHIPENGINE_RUSTC_VERSION");

/// `shipengine-rust/<version> (<os>; <arch>) rust/<rustc-version>`
pub fn default_user_agent() -> String {
    format!(
        "shipengine-rust/{} ({}; {}) rust/{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
        RUSTC_VERSION,
    )
}

fn retry_hint(response: &HttpResponse, details: Option<&RpcResponse>) -> Duration {
    let from_body = details
        .and_then(|d| d.error.as_ref())
        .and_then(|e| e.data.as_ref())
        .and_then(|data| data.retry_after)
        .map(Duration::from_millis);

    let from_header = || {
        response
            .headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    };

    from_body.or_else(from_header).unwrap_or(DEFAULT_RETRY_AFTER)
}

fn rate_limit_error(wait: Duration, details: Option<RpcResponse>) -> ShipEngineError {
    let mut err = ShipEngineError::rate_limited(wait);
    if let Some(details) = details {
        err.request_id = details.id;
        if let Some(payload) = details.error {
            if !payload.message.is_empty() {
                err.message = payload.message;
            }
            if let Some(data) = payload.data {
                err.error_source = data.error_source;
                if let Some(url) = data.url {
                    err.url = Some(url);
                }
            }
        }
    }
    err
}

fn backend_failure(err: TransportError, config: &ShipEngineConfig) -> ShipEngineError {
    match err {
        TransportError::Timeout(_) => {
            warn!(timeout_ms = config.timeout().as_millis() as u64, "Request timed out");
            ShipEngineError::timeout(config.timeout())
        }
        other => {
            warn!(error = %other, "HTTP request failed");
            ShipEngineError::transport(0, other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use proptest::prelude::*;
    use serde_json::json;
    use shipengine_core::{ConfigOptions, ErrorKind, ErrorSource, RequestId};
    use std::cell::RefCell;

    thread_local! {
        static SLEPT: RefCell<Vec<Duration>> = const { RefCell::new(Vec::new()) };
    }

    fn record_sleep(wait: Duration) {
        SLEPT.with(|s| s.borrow_mut().push(wait));
    }

    fn slept() -> Vec<Duration> {
        SLEPT.with(|s| s.borrow().clone())
    }

    fn config(retries: u32) -> ShipEngineConfig {
        ShipEngineConfig::new(
            ConfigOptions::new()
                .api_key("TEST_key")
                .retries(retries)
                .timeout(Duration::from_secs(5)),
        )
        .unwrap()
    }

    fn rate_limited(retry_after_ms: u64) -> HttpResponse {
        HttpResponse::json(
            StatusCode::TOO_MANY_REQUESTS,
            &json!({
                "id": "req_limited",
                "jsonrpc": "2.0",
                "error": {
                    "code": -32603,
                    "message": "You have exceeded the rate limit.",
                    "data": {
                        "error_source": "shipengine",
                        "error_type": "system",
                        "error_code": "rate_limit_exceeded",
                        "retry_after": retry_after_ms
                    }
                }
            }),
        )
    }

    fn ok() -> HttpResponse {
        HttpResponse::json(StatusCode::OK, &json!({"id": "req_1", "jsonrpc": "2.0", "result": {}}))
    }

    fn client(backend: MockBackend) -> TransportClient<MockBackend> {
        TransportClient::new(backend).with_sleeper(record_sleep)
    }

    #[test]
    fn test_headers_are_attached() {
        let transport = client(MockBackend::always(ok()));
        transport.send(&Bytes::from_static(b"{}"), &config(1)).unwrap();

        let sent = &transport.backend().requests()[0];
        assert_eq!(sent.headers.get("api-key").unwrap(), "TEST_key");
        assert!(sent.headers.get("api-key").unwrap().is_sensitive());
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(sent
            .headers
            .get(USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("shipengine-rust/"));
        assert_eq!(sent.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_retries_then_succeeds() {
        let backend = MockBackend::always(ok());
        backend
            .push_response(rate_limited(200))
            .push_response(rate_limited(300));
        let transport = client(backend);

        let response = transport.send(&Bytes::from_static(b"{}"), &config(2)).unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(transport.backend().call_count(), 3);
        assert_eq!(
            slept(),
            vec![Duration::from_millis(200), Duration::from_millis(300)]
        );
        let bodies: Vec<Bytes> = transport
            .backend()
            .requests()
            .into_iter()
            .map(|r| r.body)
            .collect();
        assert!(bodies.iter().all(|b| b == &Bytes::from_static(b"{}")));
    }

    #[test]
    fn test_rate_limit_after_retries_exhausted() {
        let transport = client(MockBackend::always(rate_limited(100)));

        let err = transport.send(&Bytes::from_static(b"{}"), &config(2)).unwrap_err();

        assert_eq!(transport.backend().call_count(), 3);
        assert_eq!(
            err.kind,
            ErrorKind::RateLimit {
                retry_after: Duration::from_millis(100)
            }
        );
        assert_eq!(err.request_id, Some(RequestId::from("req_limited")));
        assert_eq!(err.error_source, ErrorSource::ShipEngine);
        assert_eq!(err.error_code, ErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_zero_retries_fails_on_first_429() {
        let transport = client(MockBackend::always(rate_limited(100)));
        let err = transport.send(&Bytes::from_static(b"{}"), &config(0)).unwrap_err();
        assert_eq!(transport.backend().call_count(), 1);
        assert!(matches!(err.kind, ErrorKind::RateLimit { .. }));
        assert!(slept().is_empty());
    }

    #[test]
    fn test_hint_longer_than_timeout_is_a_timeout() {
        let transport = client(MockBackend::always(rate_limited(10_000)));
        let err = transport.send(&Bytes::from_static(b"{}"), &config(3)).unwrap_err();

        assert_eq!(transport.backend().call_count(), 1);
        assert_eq!(
            err.kind,
            ErrorKind::Timeout {
                retry_after: Duration::from_secs(5)
            }
        );
        assert_eq!(err.error_code, ErrorCode::Timeout);
    }

    #[test]
    fn test_retry_after_header_and_default() {
        let with_header = HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, "")
            .with_header(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(retry_hint(&with_header, None), Duration::from_secs(2));

        let bare = HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, "busy");
        assert_eq!(retry_hint(&bare, None), DEFAULT_RETRY_AFTER);
    }

    #[test]
    fn test_other_statuses_not_retried() {
        let transport = client(MockBackend::always(HttpResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "",
        )));
        let response = transport.send(&Bytes::from_static(b"{}"), &config(3)).unwrap();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(transport.backend().call_count(), 1);
    }

    #[test]
    fn test_backend_failures() {
        let backend = MockBackend::new();
        backend
            .push_error(TransportError::Timeout(Duration::from_secs(5)))
            .push_error(TransportError::Connection("refused".to_string()))
            .push_error(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "pipe closed",
            )));
        let transport = client(backend);

        let err = transport.send(&Bytes::from_static(b"{}"), &config(1)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Timeout { .. }));

        let err = transport.send(&Bytes::from_static(b"{}"), &config(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport { status: 0 });
        assert!(err.message.contains("refused"));

        let err = transport.send(&Bytes::from_static(b"{}"), &config(1)).unwrap_err();
        assert_eq!(err.status(), Some(0));
        assert!(err.message.contains("pipe closed"));
    }

    #[test]
    fn test_resolve_base_uri() {
        let config = config(1);
        assert_eq!(resolve_base_uri(&config, None), config.base_uri());
        assert_eq!(resolve_base_uri(&config, Some(String::new())), config.base_uri());
        assert_eq!(
            resolve_base_uri(&config, Some("not a uri".to_string())),
            config.base_uri()
        );
        assert_eq!(
            resolve_base_uri(&config, Some("http://localhost:8080/".to_string())),
            "http://localhost:8080/"
        );
    }

    #[test]
    fn test_user_agent_names_compiler() {
        let transport = client(MockBackend::always(ok()));
        let user_agent = transport.user_agent();
        let prefix = format!("shipengine-rust/{} (", env!("CARGO_PKG_VERSION"));
        assert!(user_agent.starts_with(&prefix));
        assert!(user_agent.ends_with(&format!(") rust/{}", RUSTC_VERSION)));
        assert!(!RUSTC_VERSION.is_empty());
        assert!(!RUSTC_VERSION.contains(char::is_whitespace));
    }

    proptest! {
        #[test]
        fn test_exactly_scripted_retries(retries in 0u32..=3, limited in 0u32..=3) {
            prop_assume!(limited <= retries);
            let backend = MockBackend::always(ok());
            for _ in 0..limited {
                backend.push_response(rate_limited(10));
            }
            let transport = client(backend);

            let response = transport.send(&Bytes::from_static(b"{}"), &config(retries)).unwrap();

            prop_assert_eq!(response.status, StatusCode::OK);
            prop_assert_eq!(transport.backend().call_count(), limited as usize + 1);
        }
    }
}
