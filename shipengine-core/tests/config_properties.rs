// Property tests for configuration validation and request ids

use proptest::prelude::*;
use shipengine_core::config::{PAGE_SIZE_RANGE, RETRIES_RANGE};
use shipengine_core::{ConfigOptions, ErrorCode, ErrorKind, RequestId, RpcRequest, ShipEngineConfig};
use std::collections::HashSet;
use std::time::Duration;

fn options(api_key: &str, retries: u32, page_size: u32, timeout_ms: u64) -> ConfigOptions {
    ConfigOptions::new()
        .api_key(api_key)
        .retries(retries)
        .page_size(page_size)
        .timeout(Duration::from_millis(timeout_ms))
}

proptest! {
    #[test]
    fn test_validation_is_idempotent(
        api_key in "[A-Za-z0-9_]{1,40}",
        retries in RETRIES_RANGE,
        page_size in PAGE_SIZE_RANGE,
        timeout_ms in 1u64..120_000,
    ) {
        let build = || ShipEngineConfig::new(options(&api_key, retries, page_size, timeout_ms));
        let first = build().unwrap();
        let second = build().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_retries_inside_bounds_accepted(retries in RETRIES_RANGE) {
        let config = ShipEngineConfig::new(options("TEST_key", retries, 50, 5000)).unwrap();
        prop_assert_eq!(config.retries(), retries);
    }

    #[test]
    fn test_retries_outside_bounds_rejected(retries in (*RETRIES_RANGE.end() + 1)..u32::MAX) {
        let err = ShipEngineConfig::new(options("TEST_key", retries, 50, 5000)).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::Validation);
        prop_assert_eq!(err.error_code, ErrorCode::InvalidFieldValue);
    }

    #[test]
    fn test_blank_api_key_rejected(api_key in "[ \t]{0,8}") {
        let err = ShipEngineConfig::new(options(&api_key, 1, 50, 5000)).unwrap_err();
        prop_assert_eq!(err.error_code, ErrorCode::FieldValueRequired);
    }

    #[test]
    fn test_merge_keeps_unset_fields(retries in RETRIES_RANGE, timeout_ms in 1u64..60_000) {
        let base = ShipEngineConfig::new(options("TEST_key", retries, 25, 5000)).unwrap();
        let merged = base
            .merge(&ConfigOptions::new().timeout(Duration::from_millis(timeout_ms)))
            .unwrap();
        prop_assert_eq!(merged.retries(), retries);
        prop_assert_eq!(merged.page_size(), 25);
        prop_assert_eq!(merged.timeout(), Duration::from_millis(timeout_ms));
    }

    #[test]
    fn test_batch_ids_unique(count in 1usize..500) {
        let ids: HashSet<RequestId> = (0..count)
            .map(|_| RpcRequest::new("package/track", None).id().clone())
            .collect();
        prop_assert_eq!(ids.len(), count);
    }
}
