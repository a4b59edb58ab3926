//! Core domain types for the Ark relay gateway: signing sessions,
//! challenges, VTXO inventory records, balances, Lightning invoices and the
//! wire-level relay event payloads. No I/O lives here.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

pub mod balance;
pub mod canonical;
pub mod challenge;
pub mod events;
pub mod intent;
pub mod invoice;
pub mod session;
pub mod vtxo;

mod error;

pub use balance::AssetBalance;
pub use challenge::ChallengePayload;
pub use challenge::SigningChallenge;
pub use error::Error;
pub use error::ErrorContext;
pub use error::ErrorKind;
pub use intent::Intent;
pub use intent::IntentParams;
pub use intent::SessionType;
pub use invoice::InvoiceStatus;
pub use invoice::InvoiceType;
pub use invoice::LightningInvoice;
pub use session::SessionResult;
pub use session::SessionState;
pub use session::SigningSession;
pub use vtxo::Vtxo;
pub use vtxo::VtxoStatus;

/// Current unix time in seconds.
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
