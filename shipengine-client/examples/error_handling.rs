// Rust Client Example: Error Handling
// Shows how each kind of failure is reported:
// - invalid configuration, caught before any request
// - validation errors returned by the server
// - rate limiting and timeouts

use anyhow::Result;
use serde_json::json;
use shipengine_client::{ConfigOptions, ErrorKind, ShipEngine, ShipEngineError};
use std::time::Duration;
use tracing::info;

fn report(err: &ShipEngineError) {
    info!(
        kind = err.kind.name(),
        request_id = ?err.request_id,
        source = %err.error_source,
        code = %err.error_code,
        "{}",
        err
    );
    match err.kind {
        ErrorKind::RateLimit { retry_after } => {
            info!("Try again in {} ms", retry_after.as_millis())
        }
        ErrorKind::Timeout { retry_after } => {
            info!("Gave up after {} ms", retry_after.as_millis())
        }
        ErrorKind::Transport { status } => info!("HTTP status {}", status),
        _ => {}
    }
    if let Some(url) = &err.url {
        info!("See {}", url);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Invalid configuration never reaches the network.
    let invalid = ConfigOptions::new().api_key("").retries(7).page_size(0);
    if let Err(e) = ShipEngine::new(invalid) {
        report(&e);
    }

    let api_key =
        std::env::var("SHIPENGINE_API_KEY").unwrap_or_else(|_| "TEST_invalid".to_string());
    let client = ShipEngine::new(ConfigOptions::new().api_key(api_key))?;

    // An empty address is rejected by the server.
    if let Err(e) = client.call("address/validate", Some(json!({}))) {
        report(&e);
    }

    // A tight per-call timeout turns slow responses and long rate-limit waits into timeouts.
    let impatient = ConfigOptions::new().timeout(Duration::from_millis(1)).retries(0);
    if let Err(e) = client.call_with("carrier/list", None, &impatient) {
        report(&e);
    }

    Ok(())
}
