//! Relay gateway: mediates between wallets on a pub/sub relay network and
//! the Ark, Taproot-asset and Lightning daemons behind the RPC shell.
//!
//! The ceremony orchestrator drives per-intent signing sessions through
//! validation, challenge, signature verification, inventory reservation,
//! back-end commit and outcome publication. Everything stateful lives in
//! the session store; loops (event listener, sweeper, invoice monitor,
//! health probe) are spawned by the `relayd` binary.

pub mod backends;
pub mod cache;
pub mod challenge;
pub mod config;
pub mod fees;
pub mod handlers;
pub mod inventory;
pub mod jobs;
pub mod kv;
pub mod lightning;
pub mod orchestrator;
pub mod publisher;
pub mod store;
pub mod sweeper;

pub use backends::ArkService;
pub use backends::AssetService;
pub use backends::LightningService;
pub use cache::ReadThroughCache;
pub use config::Settings;
pub use handlers::IntentHandler;
pub use handlers::ResponseHandler;
pub use inventory::Inventory;
pub use jobs::Job;
pub use jobs::JobKind;
pub use jobs::JobQueue;
pub use kv::InMemoryKv;
pub use kv::KvStore;
pub use lightning::LightningCoordinator;
pub use lightning::RecoveryTracker;
pub use orchestrator::Orchestrator;
pub use orchestrator::SessionLocks;
pub use publisher::OutboundPublisher;
pub use store::SessionStore;
pub use sweeper::Sweeper;
