use crate::client::gateway_event_from;
use crate::client::RelayClient;
use crate::event::GatewayEvent;
use async_trait::async_trait;
use nostr_sdk::RelayPoolNotification;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Retained tail of received events for inspection.
const EVENT_RING_CAPACITY: usize = 1000;

/// A handler for one event kind. Handlers must be fast or offload; the
/// dispatch loop is shared by all kinds.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: GatewayEvent) -> Result<(), relay_core::Error>;
}

/// Compact record kept in the ring log.
#[derive(Debug, Clone)]
pub struct EventSummary {
    pub id: String,
    pub pubkey: String,
    pub kind: u16,
    pub created_at: i64,
    pub content_length: usize,
}

/// Routes received events to the handlers registered for their kind.
///
/// Registration happens once at startup; the handler map is never mutated
/// afterwards.
pub struct EventDispatcher {
    handlers: HashMap<u16, Vec<Arc<dyn EventHandler>>>,
    ring: Mutex<VecDeque<EventSummary>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            ring: Mutex::new(VecDeque::with_capacity(EVENT_RING_CAPACITY)),
        }
    }

    pub fn register(&mut self, kind: u16, handler: Arc<dyn EventHandler>) {
        self.handlers.entry(kind).or_default().push(handler);
        tracing::info!(kind, "Registered event handler");
    }

    /// Deliver one event to every handler of its kind. Handler failures are
    /// logged and counted; they never stop the loop.
    pub async fn dispatch(&self, event: GatewayEvent, client: &RelayClient) {
        self.log_to_ring(&event);

        let Some(handlers) = self.handlers.get(&event.kind) else {
            tracing::debug!(kind = event.kind, "No handler for event kind");
            return;
        };

        for handler in handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                client.stats().handler_errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    kind = event.kind,
                    event_id = %event.id,
                    "Event handler failed: {e}"
                );
            }
        }
    }

    fn log_to_ring(&self, event: &GatewayEvent) {
        let summary = EventSummary {
            id: event.id.clone(),
            pubkey: event.pubkey.clone(),
            kind: event.kind,
            created_at: event.created_at,
            content_length: event.content.len(),
        };

        let mut ring = match self.ring.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if ring.len() == EVENT_RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(summary);
    }

    pub fn recent_events(&self) -> Vec<EventSummary> {
        let ring = match self.ring.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        ring.iter().cloned().collect()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide event listening loop.
///
/// Consumes the relay pool's notification queue, converts each event to the
/// adapter's wire shape and hands it to the dispatcher. Cancellable between
/// iterations; each event is delivered to each registered handler at most
/// once.
pub async fn run_event_loop(
    client: RelayClient,
    dispatcher: Arc<EventDispatcher>,
    shutdown: CancellationToken,
) {
    let mut notifications = client.notifications();
    tracing::info!("Relay event loop started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Relay event loop stopping");
                break;
            }
            notification = notifications.recv() => match notification {
                Ok(RelayPoolNotification::Event { event, .. }) => {
                    client.note_received();
                    let event = gateway_event_from(&event);
                    dispatcher.dispatch(event, &client).await;
                }
                Ok(RelayPoolNotification::Message { .. }) => {}
                Ok(RelayPoolNotification::Shutdown) => {
                    tracing::warn!("Relay pool shut down, stopping event loop");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event loop lagged behind relay notifications");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Relay notification channel closed");
                    // Brief pause so a tight restart loop cannot spin.
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    break;
                }
            }
        }
    }
}
