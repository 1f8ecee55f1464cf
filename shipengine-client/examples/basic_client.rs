// Rust Client Example: Basic RPC Calls
// Validates an address, tracks a package and lists carrier accounts.
// Set SHIPENGINE_API_KEY (and optionally SHIPENGINE_BASE_URI) before running.

use anyhow::{Context, Result};
use serde_json::json;
use shipengine_client::{CarrierAccountCache, ConfigOptions, RpcMethod, ShipEngine};
use std::time::Duration;
use tracing::info;

fn main() -> Result<()> {
    let _guard = shipengine_client::logging::init_logging("logs", "basic_client")?;

    let api_key = std::env::var("SHIPENGINE_API_KEY").context("SHIPENGINE_API_KEY is not set")?;
    let client = ShipEngine::new(
        ConfigOptions::new()
            .api_key(api_key)
            .retries(2)
            .timeout(Duration::from_secs(10)),
    )?;
    info!(config = ?client.config(), "Client created");

    let validated = client.call(
        RpcMethod::AddressValidate,
        Some(json!({
            "street": ["4 Jersey St"],
            "city_locality": "Boston",
            "state_province": "MA",
            "postal_code": "02215",
            "country_code": "US"
        })),
    )?;
    info!("Address: {}", serde_json::to_string_pretty(&validated)?);

    let mut batch = client.batch();
    let ups = batch.call(
        RpcMethod::PackageTrack,
        Some(json!({"carrier_code": "ups", "tracking_number": "1Z9999999999999999"})),
    );
    let fedex = batch.call(
        RpcMethod::PackageTrack,
        Some(json!({"carrier_code": "fedex", "tracking_number": "999999999999"})),
    );
    let results = batch.execute()?;
    for (name, pending) in [("ups", &ups), ("fedex", &fedex)] {
        match results.get(pending) {
            Ok(tracking) => info!("{} tracking: {}", name, tracking),
            Err(e) => info!("{} tracking failed ({}): {}", name, e.kind.name(), e),
        }
    }

    let mut carriers = CarrierAccountCache::new();
    let accounts = carriers.get_or_fetch(&client)?;
    info!("Carrier accounts: {}", accounts);

    Ok(())
}
