//! gRPC client shell for the three back-end daemons (arkd, tapd, lnd).
//!
//! Transport concerns live here once: channel lifecycle and TLS, message
//! size bounds, keepalive, retry with exponential backoff, a per-client
//! circuit breaker and the parallel health fan-out. Everything above this
//! crate deals in domain types, not protobufs.

#[allow(warnings)]
#[allow(clippy::all)]
#[path = ""]
mod generated {
    #[path = ""]
    pub mod ark {
        #[path = "ark.v1.rs"]
        pub mod v1;
    }
    #[path = ""]
    pub mod tap {
        #[path = "tap.v1.rs"]
        pub mod v1;
    }
    #[path = ""]
    pub mod lnd {
        #[path = "lnd.v1.rs"]
        pub mod v1;
    }
}

pub mod breaker;

mod ark;
mod asset;
mod channel;
mod error;
mod lightning;
mod manager;
mod types;

pub use ark::ArkClient;
pub use asset::AssetClient;
pub use breaker::BreakerState;
pub use breaker::CircuitBreaker;
pub use breaker::CircuitBreakerConfig;
pub use channel::ConnectionConfig;
pub use channel::RetryPolicy;
pub use error::Error;
pub use lightning::LightningClient;
pub use manager::ClientManager;
pub use manager::HealthReport;
pub use types::ArkInfo;
pub use types::ArkTransaction;
pub use types::AssetInfo;
pub use types::AssetInvoice;
pub use types::BackendSessionStatus;
pub use types::ChannelSummary;
pub use types::CreatedInvoice;
pub use types::InvoiceState;
pub use types::InvoiceUpdate;
pub use types::NodeBalance;
pub use types::NodeInfo;
pub use types::PaymentOutcome;
pub use types::PaymentState;
pub use types::PreparedSigningRequest;
pub use types::ServiceKind;
pub use types::SessionStatus;
pub use types::SubmitOutcome;
