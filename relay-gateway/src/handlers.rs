//! Relay event handlers: the bridge from the dispatcher into the
//! orchestrator.
//!
//! The dispatch loop is shared by every event kind, so the handlers do
//! only the fast work inline (signature verification, decryption, parsing)
//! and offload the ceremony itself onto a task. The per-session lock keeps
//! offloaded drivers serialized; the admission threshold bounds how many
//! sessions can be in flight at once.

use crate::backends::ArkService;
use crate::backends::AssetService;
use crate::backends::LightningService;
use crate::orchestrator::Orchestrator;
use crate::publisher::OutboundPublisher;
use async_trait::async_trait;
use relay_core::events;
use relay_core::Error;
use relay_nostr::EventHandler;
use relay_nostr::GatewayEvent;
use std::sync::Arc;

/// Handles `KIND_INTENT` events.
pub struct IntentHandler<A: ArkService, T, L, P> {
    orchestrator: Arc<Orchestrator<A, T, L, P>>,
}

impl<A: ArkService, T, L, P> IntentHandler<A, T, L, P> {
    pub fn new(orchestrator: Arc<Orchestrator<A, T, L, P>>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl<A, T, L, P> EventHandler for IntentHandler<A, T, L, P>
where
    A: ArkService,
    T: AssetService,
    L: LightningService,
    P: OutboundPublisher,
{
    async fn handle(&self, event: GatewayEvent) -> Result<(), Error> {
        event.verify().map_err(Error::from)?;

        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            match orchestrator.handle_intent(&event.pubkey, &event.content).await {
                Ok(session_id) => {
                    tracing::debug!(event_id = %event.id, session_id, "Intent processed");
                }
                Err(e) => {
                    tracing::warn!(event_id = %event.id, "Intent rejected: {e}");
                }
            }
        });

        Ok(())
    }
}

/// Handles `KIND_RESPONSE` events, decrypting the NIP-04 payload.
pub struct ResponseHandler<A: ArkService, T, L, P> {
    orchestrator: Arc<Orchestrator<A, T, L, P>>,
    publisher: Arc<P>,
}

impl<A: ArkService, T, L, P> ResponseHandler<A, T, L, P> {
    pub fn new(orchestrator: Arc<Orchestrator<A, T, L, P>>, publisher: Arc<P>) -> Self {
        Self {
            orchestrator,
            publisher,
        }
    }
}

#[async_trait]
impl<A, T, L, P> EventHandler for ResponseHandler<A, T, L, P>
where
    A: ArkService,
    T: AssetService,
    L: LightningService,
    P: OutboundPublisher,
{
    async fn handle(&self, event: GatewayEvent) -> Result<(), Error> {
        event.verify().map_err(Error::from)?;

        // Responses are DM-encrypted to the gateway; tolerate a cleartext
        // payload from wallets that skip encryption.
        let cleartext = match self.publisher.decrypt(&event.pubkey, &event.content) {
            Ok(cleartext) => cleartext,
            Err(_) => event.content.clone(),
        };

        let response: events::ResponseContent = serde_json::from_str(&cleartext)
            .map_err(|e| Error::invalid_intent(format!("malformed signing response: {e}")))?;

        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            match orchestrator
                .handle_signing_response(&event.pubkey, &response.challenge_id, &response.signature)
                .await
            {
                Ok(()) => {
                    tracing::debug!(
                        event_id = %event.id,
                        challenge_id = %response.challenge_id,
                        "Signing response processed"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        event_id = %event.id,
                        challenge_id = %response.challenge_id,
                        "Signing response rejected: {e}"
                    );
                }
            }
        });

        Ok(())
    }
}
