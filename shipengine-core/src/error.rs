use crate::ids::RequestId;
use std::time::Duration;
use thiserror::Error;

/// Documentation page linked from rate limit errors.
pub const RATE_LIMIT_HELP_URL: &str = "https://www.shipengine.com/docs/rate-limits";

/// Documentation page linked from client timeout errors.
pub const TIMEOUT_HELP_URL: &str = "https://www.shipengine.com/docs/errors/#timeouts";

wire_enum! {
    /// Which party is responsible for an error.
    pub enum ErrorSource {
        /// The ShipEngine service itself.
        ShipEngine => "shipengine",
        /// A shipping carrier behind ShipEngine.
        Carrier => "carrier",
        /// An order source marketplace.
        OrderSource => "order_source",
    }
}

wire_enum! {
    /// Coarse category of a server-declared error.
    pub enum ErrorType {
        AccountStatus => "account_status",
        Security => "security",
        Validation => "validation",
        BusinessRules => "business_rules",
        System => "system",
        Integrations => "integrations",
    }
}

wire_enum! {
    /// Machine-readable, fine-grained error code.
    pub enum ErrorCode {
        AutoFundNotSupported => "auto_fund_not_supported",
        BatchCannotBeModified => "batch_cannot_be_modified",
        BillingInfoNotFound => "billing_info_not_found",
        CarrierConflict => "carrier_conflict",
        CarrierNotConnected => "carrier_not_connected",
        CarrierNotSupported => "carrier_not_supported",
        ConfirmationNotSupported => "confirmation_not_supported",
        FieldConflict => "field_conflict",
        FieldValueRequired => "field_value_required",
        Forbidden => "forbidden",
        IdentifierConflict => "identifier_conflict",
        IdentifiersMustMatch => "identifiers_must_match",
        InsufficientFunds => "insufficient_funds",
        InvalidAddress => "invalid_address",
        InvalidBillingPlan => "invalid_billing_plan",
        InvalidFieldValue => "invalid_field_value",
        InvalidIdentifier => "invalid_identifier",
        InvalidStatus => "invalid_status",
        InvalidStringLength => "invalid_string_length",
        LabelImagesNotSupported => "label_images_not_supported",
        MeterFailure => "meter_failure",
        NotFound => "not_found",
        RateLimitExceeded => "rate_limit_exceeded",
        RequestBodyRequired => "request_body_required",
        ReturnLabelNotSupported => "return_label_not_supported",
        SubscriptionInactive => "subscription_inactive",
        TermsNotAccepted => "terms_not_accepted",
        Timeout => "timeout",
        TrackingNotSupported => "tracking_not_supported",
        TrialExpired => "trial_expired",
        Unauthorized => "unauthorized",
        Unknown => "unknown",
        Unspecified => "unspecified",
        VerificationFailure => "verification_failure",
        WarehouseConflict => "warehouse_conflict",
        WebhookEventTypeConflict => "webhook_event_type_conflict",
    }
}

impl Default for ErrorSource {
    fn default() -> Self {
        ErrorSource::ShipEngine
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Unspecified
    }
}

/// The closed set of failure kinds a call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A failure outside the JSON-RPC envelope: a non-200 status, or no
    /// status at all (`status == 0`) when the exchange never completed.
    Transport { status: u16 },
    /// HTTP 429 after every allowed retry was spent.
    RateLimit { retry_after: Duration },
    /// The local timeout elapsed, or the server asked us to wait longer than it.
    Timeout { retry_after: Duration },
    AccountStatus,
    Security,
    Validation,
    BusinessRule,
    System,
    /// Fallback for an `error_type` this client does not recognise.
    Unspecified,
}

impl ErrorKind {
    /// Map a server-declared error type to the error kind raised for it.
    pub fn from_error_type(error_type: &ErrorType) -> Self {
        match error_type {
            ErrorType::AccountStatus => ErrorKind::AccountStatus,
            ErrorType::Security => ErrorKind::Security,
            ErrorType::Validation => ErrorKind::Validation,
            ErrorType::BusinessRules => ErrorKind::BusinessRule,
            ErrorType::System => ErrorKind::System,
            ErrorType::Integrations | ErrorType::Other(_) => ErrorKind::Unspecified,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Transport { .. } => "transport",
            ErrorKind::RateLimit { .. } => "rate_limit",
            ErrorKind::Timeout { .. } => "timeout",
            ErrorKind::AccountStatus => "account_status",
            ErrorKind::Security => "security",
            ErrorKind::Validation => "validation",
            ErrorKind::BusinessRule => "business_rule",
            ErrorKind::System => "system",
            ErrorKind::Unspecified => "unspecified",
        }
    }
}

/// Every failure surfaced by this SDK.
///
/// The `kind` selects what went wrong; the remaining fields are the details a
/// caller needs to report it: who is responsible, the machine-readable code,
/// and the request id to quote in a support request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ShipEngineError {
    pub kind: ErrorKind,
    pub message: String,
    /// Absent for failures that never reached the server.
    pub request_id: Option<RequestId>,
    pub error_source: ErrorSource,
    pub error_type: ErrorType,
    pub error_code: ErrorCode,
    /// Link to documentation about this error, when one exists.
    pub url: Option<String>,
}

impl ShipEngineError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        error_source: ErrorSource,
        error_type: ErrorType,
        error_code: ErrorCode,
    ) -> Self {
        ShipEngineError {
            kind,
            message: message.into(),
            request_id: None,
            error_source,
            error_type,
            error_code,
            url: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<RequestId>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// A client-side validation failure.
    pub fn validation(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self::new(
            ErrorKind::Validation,
            message,
            ErrorSource::ShipEngine,
            ErrorType::Validation,
            error_code,
        )
    }

    /// A non-200 response, or a request that never got a response (`status == 0`).
    pub fn transport(status: u16, reason: impl std::fmt::Display) -> Self {
        let message = if status == 0 {
            format!("HTTP request failed: {}", reason)
        } else {
            format!("{} {}", status, reason)
        };
        Self::new(
            ErrorKind::Transport { status },
            message,
            ErrorSource::ShipEngine,
            ErrorType::System,
            ErrorCode::Unspecified,
        )
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        Self::new(
            ErrorKind::RateLimit { retry_after },
            "You have exceeded the rate limit.",
            ErrorSource::ShipEngine,
            ErrorType::System,
            ErrorCode::RateLimitExceeded,
        )
        .with_url(RATE_LIMIT_HELP_URL)
    }

    pub fn timeout(retry_after: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout { retry_after },
            format!(
                "The request took longer than the {} milliseconds allowed.",
                retry_after.as_millis()
            ),
            ErrorSource::ShipEngine,
            ErrorType::System,
            ErrorCode::Timeout,
        )
        .with_url(TIMEOUT_HELP_URL)
    }

    /// A response that does not follow the JSON-RPC envelope rules.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::System,
            message,
            ErrorSource::ShipEngine,
            ErrorType::System,
            ErrorCode::Unspecified,
        )
    }

    /// The server's retry hint for rate limit and timeout errors.
    pub fn retry_after(&self) -> Option<Duration> {
        match self.kind {
            ErrorKind::RateLimit { retry_after } | ErrorKind::Timeout { retry_after } => {
                Some(retry_after)
            }
            _ => None,
        }
    }

    /// HTTP status for transport errors.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Transport { status } => Some(status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ShipEngineError {
    fn from(err: serde_json::Error) -> Self {
        ShipEngineError::protocol(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ShipEngineError>;
