use crate::client::ShipEngine;
use serde_json::Value;
use shipengine_core::{Result, RpcMethod};
use shipengine_transport::HttpBackend;
use tracing::debug;

/// Memoized result of `carrier/list`.
///
/// The cache is a plain value owned by whoever needs it; nothing is shared
/// process-wide. Call [`invalidate`](Self::invalidate) after connecting or
/// disconnecting a carrier account.
#[derive(Debug, Clone, Default)]
pub struct CarrierAccountCache {
    accounts: Option<Value>,
}

impl CarrierAccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached accounts, fetching them on first use.
    pub fn get_or_fetch<B: HttpBackend>(&mut self, client: &ShipEngine<B>) -> Result<&Value> {
        let accounts = match self.accounts.take() {
            Some(accounts) => accounts,
            None => {
                debug!("Fetching carrier accounts");
                client.call(RpcMethod::CarrierList, None)?
            }
        };
        Ok(self.accounts.insert(accounts))
    }

    /// Drop the cached value and fetch it again.
    pub fn refresh<B: HttpBackend>(&mut self, client: &ShipEngine<B>) -> Result<&Value> {
        self.invalidate();
        self.get_or_fetch(client)
    }

    pub fn cached(&self) -> Option<&Value> {
        self.accounts.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.accounts = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;
    use shipengine_core::{ConfigOptions, ErrorKind, ShipEngineConfig};
    use shipengine_transport::{HttpResponse, MockBackend};
    use std::sync::Arc;

    fn client(backend: Arc<MockBackend>) -> ShipEngine<Arc<MockBackend>> {
        let config = ShipEngineConfig::new(ConfigOptions::new().api_key("TEST_key")).unwrap();
        ShipEngine::with_backend(config, backend)
    }

    fn accounts(name: &str) -> HttpResponse {
        HttpResponse::json(
            StatusCode::OK,
            &json!({"id": "req_1", "jsonrpc": "2.0", "result": [{"carrier_code": name}]}),
        )
    }

    #[test]
    fn test_fetches_once() {
        let backend = Arc::new(MockBackend::always(accounts("ups")));
        let shipengine = client(backend.clone());
        let mut cache = CarrierAccountCache::new();
        assert!(cache.cached().is_none());

        let first = cache.get_or_fetch(&shipengine).unwrap().clone();
        let second = cache.get_or_fetch(&shipengine).unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(backend.call_count(), 1);
        let sent: Value = serde_json::from_slice(&backend.requests()[0].body).unwrap();
        assert_eq!(sent["method"], "carrier/list");
    }

    #[test]
    fn test_invalidate_and_refresh() {
        let backend = Arc::new(MockBackend::new());
        backend
            .push_response(accounts("ups"))
            .push_response(accounts("fedex"))
            .push_response(accounts("usps"));
        let shipengine = client(backend.clone());
        let mut cache = CarrierAccountCache::new();

        cache.get_or_fetch(&shipengine).unwrap();
        cache.invalidate();
        assert!(cache.cached().is_none());
        assert_eq!(
            cache.get_or_fetch(&shipengine).unwrap()[0]["carrier_code"],
            "fedex"
        );
        assert_eq!(cache.refresh(&shipengine).unwrap()[0]["carrier_code"], "usps");
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_failure_leaves_cache_empty() {
        let backend = Arc::new(MockBackend::always(HttpResponse::new(
            StatusCode::BAD_GATEWAY,
            "",
        )));
        let mut cache = CarrierAccountCache::new();
        let err = cache.get_or_fetch(&client(backend)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport { status: 502 });
        assert!(cache.cached().is_none());
    }
}
