use crate::error::{ErrorCode, Result, ShipEngineError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

pub const DEFAULT_BASE_URI: &str = "https://api.shipengine.com/v1/";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Longest timeout accepted; HTTP clients add it to `Instant::now()`.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

pub const PAGE_SIZE_RANGE: RangeInclusive<u32> = 1..=100;
pub const RETRIES_RANGE: RangeInclusive<u32> = 0..=3;

/// Partial configuration. Unset fields take defaults in
/// [`ShipEngineConfig::new`] or fall through to the base in
/// [`ShipEngineConfig::merge`].
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOptions {
    pub api_key: Option<String>,
    pub base_uri: Option<String>,
    pub page_size: Option<u32>,
    pub retries: Option<u32>,
    /// Serialized as whole milliseconds.
    #[serde(with = "timeout_millis")]
    pub timeout: Option<Duration>,
}

impl ConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fields set in `overrides` win; unset fields keep this value's.
    fn overlay(self, overrides: &ConfigOptions) -> Self {
        ConfigOptions {
            api_key: overrides.api_key.clone().or(self.api_key),
            base_uri: overrides.base_uri.clone().or(self.base_uri),
            page_size: overrides.page_size.or(self.page_size),
            retries: overrides.retries.or(self.retries),
            timeout: overrides.timeout.or(self.timeout),
        }
    }
}

impl fmt::Debug for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("base_uri", &self.base_uri)
            .field("page_size", &self.page_size)
            .field("retries", &self.retries)
            .field("timeout", &self.timeout)
            .finish()
    }
}

const REDACTED: &str = "<redacted>";

/// Validated, immutable client configuration.
///
/// Construction either yields a fully valid value or a single validation
/// error listing every rule that was broken.
#[derive(Clone, PartialEq, Eq)]
pub struct ShipEngineConfig {
    api_key: String,
    base_uri: String,
    page_size: u32,
    retries: u32,
    timeout: Duration,
}

impl ShipEngineConfig {
    /// Apply defaults to `options` and validate the result.
    pub fn new(options: ConfigOptions) -> Result<Self> {
        let api_key = options.api_key.unwrap_or_default();
        let base_uri = options
            .base_uri
            .unwrap_or_else(|| DEFAULT_BASE_URI.to_string());
        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let retries = options.retries.unwrap_or(DEFAULT_RETRIES);
        let timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let mut violations: Vec<(ErrorCode, String)> = Vec::new();

        if api_key.trim().is_empty() {
            violations.push((
                ErrorCode::FieldValueRequired,
                "A ShipEngine API key must be specified.".to_string(),
            ));
        } else if http::HeaderValue::from_str(&api_key).is_err() {
            violations.push((
                ErrorCode::InvalidFieldValue,
                "API key contains characters that cannot be sent in an HTTP header.".to_string(),
            ));
        }
        if !is_absolute_uri(&base_uri) {
            violations.push((
                ErrorCode::InvalidFieldValue,
                format!("Base URI must be a valid absolute URL, got '{}'.", base_uri),
            ));
        }
        if !PAGE_SIZE_RANGE.contains(&page_size) {
            violations.push((
                ErrorCode::InvalidFieldValue,
                format!(
                    "Page size must be between {} and {}, got {}.",
                    PAGE_SIZE_RANGE.start(),
                    PAGE_SIZE_RANGE.end(),
                    page_size
                ),
            ));
        }
        if !RETRIES_RANGE.contains(&retries) {
            violations.push((
                ErrorCode::InvalidFieldValue,
                format!(
                    "Retries must be between {} and {}, got {}.",
                    RETRIES_RANGE.start(),
                    RETRIES_RANGE.end(),
                    retries
                ),
            ));
        }
        if timeout.is_zero() {
            violations.push((
                ErrorCode::InvalidFieldValue,
                "Timeout must be greater than zero.".to_string(),
            ));
        } else if timeout > MAX_TIMEOUT {
            violations.push((
                ErrorCode::InvalidFieldValue,
                format!(
                    "Timeout must be at most {} milliseconds, got {}.",
                    MAX_TIMEOUT.as_millis(),
                    timeout.as_millis()
                ),
            ));
        }

        if let Some((code, _)) = violations.first() {
            let code = code.clone();
            let message = violations
                .into_iter()
                .map(|(_, message)| message)
                .collect::<Vec<_>>()
                .join(" ");
            return Err(ShipEngineError::validation(message, code));
        }

        Ok(ShipEngineConfig {
            api_key,
            base_uri,
            page_size,
            retries,
            timeout,
        })
    }

    /// Build a new config from this one with the fields set in `overrides`
    /// replaced. The merged result is validated again.
    pub fn merge(&self, overrides: &ConfigOptions) -> Result<Self> {
        Self::new(self.to_options().overlay(overrides))
    }

    /// The fully populated options this config was built from.
    pub fn to_options(&self) -> ConfigOptions {
        ConfigOptions {
            api_key: Some(self.api_key.clone()),
            base_uri: Some(self.base_uri.clone()),
            page_size: Some(self.page_size),
            retries: Some(self.retries),
            timeout: Some(self.timeout),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for ShipEngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShipEngineConfig")
            .field("api_key", &REDACTED)
            .field("base_uri", &self.base_uri)
            .field("page_size", &self.page_size)
            .field("retries", &self.retries)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// An absolute http(s) URL with a host.
pub fn is_absolute_uri(value: &str) -> bool {
    match value.parse::<http::Uri>() {
        Ok(uri) => {
            matches!(uri.scheme_str(), Some("http") | Some("https")) && uri.authority().is_some()
        }
        Err(_) => false,
    }
}

mod timeout_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timeout) => serializer.serialize_some(&(timeout.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
