use relay_core::ErrorKind;
use std::fmt;

/// Transport-layer error produced by the RPC shell.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(ErrorRepr);

#[derive(Debug, thiserror::Error)]
enum ErrorRepr {
    #[error("connect error: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("RPC error: {0}")]
    Request(#[source] tonic::Status),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("circuit breaker is open")]
    CircuitOpen,
    #[error("TLS setup error: {0}")]
    Tls(String),
}

impl Error {
    pub fn connect(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(ErrorRepr::Connect(Box::new(e)))
    }

    pub fn request(status: tonic::Status) -> Self {
        Self(ErrorRepr::Request(status))
    }

    pub fn conversion(e: impl fmt::Display) -> Self {
        Self(ErrorRepr::Conversion(e.to_string()))
    }

    pub(crate) fn circuit_open() -> Self {
        Self(ErrorRepr::CircuitOpen)
    }

    pub(crate) fn tls(e: impl fmt::Display) -> Self {
        Self(ErrorRepr::Tls(e.to_string()))
    }

    /// Only deadline-exceeded and unavailable warrant a retry; every other
    /// status is a semantic answer and must propagate unwrapped.
    pub fn is_retryable(&self) -> bool {
        match &self.0 {
            ErrorRepr::Request(status) => matches!(
                status.code(),
                tonic::Code::DeadlineExceeded | tonic::Code::Unavailable
            ),
            ErrorRepr::Connect(_)
            | ErrorRepr::Conversion(_)
            | ErrorRepr::CircuitOpen
            | ErrorRepr::Tls(_) => false,
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self.0, ErrorRepr::CircuitOpen)
    }

    /// The underlying gRPC status, when the error came from a call.
    pub fn status(&self) -> Option<&tonic::Status> {
        match &self.0 {
            ErrorRepr::Request(status) => Some(status),
            ErrorRepr::Connect(_)
            | ErrorRepr::Conversion(_)
            | ErrorRepr::CircuitOpen
            | ErrorRepr::Tls(_) => None,
        }
    }
}

impl From<Error> for relay_core::Error {
    fn from(e: Error) -> Self {
        let kind = match &e.0 {
            ErrorRepr::CircuitOpen => ErrorKind::ServiceUnavailable,
            ErrorRepr::Connect(_) => ErrorKind::ServiceUnavailable,
            ErrorRepr::Request(status) => match status.code() {
                tonic::Code::DeadlineExceeded => ErrorKind::ServiceTimeout,
                tonic::Code::Unavailable => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::ServiceProtocolError,
            },
            ErrorRepr::Conversion(_) | ErrorRepr::Tls(_) => ErrorKind::ServiceProtocolError,
        };
        relay_core::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_codes() {
        assert!(Error::request(tonic::Status::unavailable("down")).is_retryable());
        assert!(Error::request(tonic::Status::deadline_exceeded("slow")).is_retryable());
        assert!(!Error::request(tonic::Status::invalid_argument("bad")).is_retryable());
        assert!(!Error::circuit_open().is_retryable());
    }

    #[test]
    fn maps_to_domain_kinds() {
        let kind = relay_core::Error::from(Error::circuit_open()).kind();
        assert_eq!(kind, ErrorKind::ServiceUnavailable);

        let kind =
            relay_core::Error::from(Error::request(tonic::Status::deadline_exceeded("x"))).kind();
        assert_eq!(kind, ErrorKind::ServiceTimeout);

        let kind =
            relay_core::Error::from(Error::request(tonic::Status::internal("boom"))).kind();
        assert_eq!(kind, ErrorKind::ServiceProtocolError);
    }
}
