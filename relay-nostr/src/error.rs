use relay_core::ErrorKind;
use std::fmt;

/// An error produced by the relay adapter.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(ErrorRepr);

#[derive(Debug, thiserror::Error)]
enum ErrorRepr {
    #[error("identity key error: {0}")]
    Key(String),
    #[error("relay error: {0}")]
    Relay(String),
    #[error("event error: {0}")]
    Event(String),
    #[error("encrypted DM error: {0}")]
    Dm(String),
    #[error("invalid event signature: {0}")]
    Verify(String),
}

impl Error {
    pub fn key(e: impl fmt::Display) -> Self {
        Self(ErrorRepr::Key(e.to_string()))
    }

    pub fn relay(e: impl fmt::Display) -> Self {
        Self(ErrorRepr::Relay(e.to_string()))
    }

    pub fn event(e: impl fmt::Display) -> Self {
        Self(ErrorRepr::Event(e.to_string()))
    }

    pub fn dm(e: impl fmt::Display) -> Self {
        Self(ErrorRepr::Dm(e.to_string()))
    }

    pub fn verify(e: impl fmt::Display) -> Self {
        Self(ErrorRepr::Verify(e.to_string()))
    }

    pub fn is_invalid_signature(&self) -> bool {
        matches!(self.0, ErrorRepr::Verify(_))
    }
}

impl From<Error> for relay_core::Error {
    fn from(e: Error) -> Self {
        let kind = match e.0 {
            ErrorRepr::Verify(_) => ErrorKind::InvalidSignature,
            ErrorRepr::Key(_) | ErrorRepr::Relay(_) | ErrorRepr::Event(_) | ErrorRepr::Dm(_) => {
                ErrorKind::Internal
            }
        };
        relay_core::Error::new(kind, e)
    }
}
