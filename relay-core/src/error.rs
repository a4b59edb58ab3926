use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Machine-readable error kinds, organized by layer.
///
/// The snake_case name of each variant is the `code` field carried by
/// outbound failure events, so renaming a variant is a wire format change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // Intent validation.
    InvalidIntent,
    UnknownSessionType,
    ExpiredIntent,
    InsufficientBalance,
    InvalidInvoice,
    // Challenge and authentication.
    ChallengeNotFound,
    ChallengeExpired,
    ChallengeAlreadyUsed,
    InvalidSignature,
    // Inventory.
    InsufficientInventory,
    ReservationLost,
    // Back-end transport.
    ServiceUnavailable,
    ServiceTimeout,
    ServiceProtocolError,
    // Lightning.
    InvoiceExpired,
    PaymentFailed,
    RateLimited,
    ChannelUnavailable,
    // Internal.
    StoreConflict,
    Shutdown,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidIntent => "invalid_intent",
            ErrorKind::UnknownSessionType => "unknown_session_type",
            ErrorKind::ExpiredIntent => "expired_intent",
            ErrorKind::InsufficientBalance => "insufficient_balance",
            ErrorKind::InvalidInvoice => "invalid_invoice",
            ErrorKind::ChallengeNotFound => "challenge_not_found",
            ErrorKind::ChallengeExpired => "challenge_expired",
            ErrorKind::ChallengeAlreadyUsed => "challenge_already_used",
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::InsufficientInventory => "insufficient_inventory",
            ErrorKind::ReservationLost => "reservation_lost",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::ServiceTimeout => "service_timeout",
            ErrorKind::ServiceProtocolError => "service_protocol_error",
            ErrorKind::InvoiceExpired => "invoice_expired",
            ErrorKind::PaymentFailed => "payment_failed",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ChannelUnavailable => "channel_unavailable",
            ErrorKind::StoreConflict => "store_conflict",
            ErrorKind::Shutdown => "shutdown",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error generated by the gateway.
///
/// Carries a domain [`ErrorKind`] so callers can map any failure to a wire
/// `code` without inspecting message text.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl fmt::Display) -> Self {
        Self {
            kind,
            message: message.to_string(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl fmt::Display,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// An unclassified internal error.
    pub fn ad_hoc(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn invalid_intent(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidIntent, message)
    }

    pub fn invalid_signature(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidSignature, message)
    }

    pub fn store_conflict(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::StoreConflict, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Extension trait to prepend context to an error, keeping its kind.
pub trait ErrorContext<T> {
    fn context(self, context: &str) -> Result<T, Error>;
    fn with_context(self, context: impl FnOnce() -> String) -> Result<T, Error>;
}

impl<T> ErrorContext<T> for Result<T, Error> {
    fn context(self, context: &str) -> Result<T, Error> {
        self.map_err(|e| Error {
            kind: e.kind,
            message: format!("{context}: {}", e.message),
            source: e.source,
        })
    }

    fn with_context(self, context: impl FnOnce() -> String) -> Result<T, Error> {
        self.map_err(|e| Error {
            kind: e.kind,
            message: format!("{}: {}", context(), e.message),
            source: e.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_codes_are_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ChallengeAlreadyUsed).unwrap();
        assert_eq!(json, "\"challenge_already_used\"");
        assert_eq!(ErrorKind::ChallengeAlreadyUsed.as_str(), "challenge_already_used");
    }

    #[test]
    fn context_preserves_kind() {
        let err: Result<(), Error> = Err(Error::new(ErrorKind::InsufficientBalance, "short"));
        let err = err.context("validating transfer").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(err.to_string(), "insufficient_balance: validating transfer: short");
    }
}
