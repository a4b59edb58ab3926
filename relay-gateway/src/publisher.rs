//! Outbound relay seam.
//!
//! The orchestrator publishes through this trait so ceremony tests can
//! capture the exact event sequence without a relay network.

use async_trait::async_trait;
use relay_core::events;
use relay_core::now_unix;
use relay_core::Error;
use relay_core::ErrorKind;
use relay_core::SessionState;

#[async_trait]
pub trait OutboundPublisher: Send + Sync + 'static {
    /// Sign and publish an event of `kind` addressed to `recipient`.
    /// Returns the event id.
    async fn publish(&self, kind: u16, content: String, recipient: &str)
        -> Result<String, Error>;

    fn encrypt(&self, recipient: &str, cleartext: &str) -> Result<String, Error>;

    fn decrypt(&self, sender: &str, ciphertext: &str) -> Result<String, Error>;
}

#[async_trait]
impl OutboundPublisher for relay_nostr::RelayClient {
    async fn publish(
        &self,
        kind: u16,
        content: String,
        recipient: &str,
    ) -> Result<String, Error> {
        self.publish_event(kind, content, Some(recipient))
            .await
            .map_err(Into::into)
    }

    fn encrypt(&self, recipient: &str, cleartext: &str) -> Result<String, Error> {
        self.encrypt_dm(recipient, cleartext).map_err(Into::into)
    }

    fn decrypt(&self, sender: &str, ciphertext: &str) -> Result<String, Error> {
        self.decrypt_dm(sender, ciphertext).map_err(Into::into)
    }
}

/// Publish an interim status update. Failures are logged, never fatal: a
/// missed status event must not fail the ceremony driving it.
pub async fn publish_status<P: OutboundPublisher + ?Sized>(
    publisher: &P,
    user_pubkey: &str,
    session_id: &str,
    state: SessionState,
    step: Option<&str>,
    invoice: Option<&str>,
) {
    let content = events::StatusContent {
        session_id: session_id.to_string(),
        status: state.as_str().to_string(),
        step: step.map(String::from),
        progress: None,
        invoice: invoice.map(String::from),
    };

    let content = match serde_json::to_string(&content) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(session_id, "Failed to serialize status event: {e}");
            return;
        }
    };

    if let Err(e) = publisher
        .publish(events::KIND_STATUS, content, user_pubkey)
        .await
    {
        tracing::warn!(session_id, "Failed to publish status event: {e}");
    }
}

/// Publish the terminal success event for a session.
pub async fn publish_success<P: OutboundPublisher + ?Sized>(
    publisher: &P,
    user_pubkey: &str,
    ref_action_id: &str,
    results: events::SuccessResults,
) {
    let content = events::SuccessContent::new(ref_action_id, results, now_unix());
    let content = match serde_json::to_string(&content) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(ref_action_id, "Failed to serialize success event: {e}");
            return;
        }
    };

    if let Err(e) = publisher
        .publish(events::KIND_SUCCESS, content, user_pubkey)
        .await
    {
        tracing::warn!(ref_action_id, "Failed to publish success event: {e}");
    }
}

/// Publish the terminal failure event for a session.
pub async fn publish_failure<P: OutboundPublisher + ?Sized>(
    publisher: &P,
    user_pubkey: &str,
    ref_action_id: &str,
    code: ErrorKind,
    message: &str,
) {
    let content = events::FailureContent::new(ref_action_id, code, message, now_unix());
    let content = match serde_json::to_string(&content) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(ref_action_id, "Failed to serialize failure event: {e}");
            return;
        }
    };

    if let Err(e) = publisher
        .publish(events::KIND_FAILURE, content, user_pubkey)
        .await
    {
        tracing::warn!(ref_action_id, "Failed to publish failure event: {e}");
    }
}
