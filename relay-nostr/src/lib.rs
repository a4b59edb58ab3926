//! Relay network adapter: connect/subscribe/publish against a set of
//! relays, sign outbound events with the gateway identity, verify inbound
//! signatures independently of the relay library, and encrypt/decrypt
//! NIP-04 direct messages. The event dispatcher routes typed events to
//! handlers registered at startup.

pub mod client;
pub mod dispatcher;
pub mod event;

mod error;

pub use client::gateway_event_from;
pub use client::RelayClient;
pub use client::RelayStats;
pub use dispatcher::run_event_loop;
pub use dispatcher::EventDispatcher;
pub use dispatcher::EventHandler;
pub use dispatcher::EventSummary;
pub use error::Error;
pub use event::GatewayEvent;
