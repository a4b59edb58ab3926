use crate::event::GatewayEvent;
use crate::Error;
use nostr::nips::nip04;
use nostr::Keys;
use nostr::Kind;
use nostr::PublicKey;
use nostr::Tag;
use nostr_sdk::Client;
use nostr_sdk::EventBuilder;
use nostr_sdk::Filter;
use nostr_sdk::RelayPoolNotification;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Counters exposed for the health loop.
#[derive(Debug, Default)]
pub struct RelayStats {
    pub events_received: AtomicU64,
    pub events_published: AtomicU64,
    pub handler_errors: AtomicU64,
    pub connections: AtomicU64,
}

/// Bidirectional bridge to the relay network.
///
/// Wraps the relay pool library; event signing uses the gateway identity
/// key, inbound verification is done independently in [`GatewayEvent`].
#[derive(Clone)]
pub struct RelayClient {
    keys: Keys,
    client: Client,
    relays: Vec<String>,
    stats: Arc<RelayStats>,
}

impl RelayClient {
    /// Build a client with the configured identity key, or a freshly
    /// generated one when none is configured.
    pub fn new(relays: Vec<String>, private_key_hex: Option<&str>) -> Result<Self, Error> {
        let keys = match private_key_hex {
            Some(hex) => Keys::parse(hex).map_err(Error::key)?,
            None => {
                let keys = Keys::generate();
                tracing::warn!(
                    pubkey = %keys.public_key(),
                    "No gateway identity key configured, generated an ephemeral one. \
                     Events signed with it will not be recognized after a restart."
                );
                keys
            }
        };

        let client = Client::new(keys.clone());

        Ok(Self {
            keys,
            client,
            relays,
            stats: Arc::new(RelayStats::default()),
        })
    }

    pub fn public_key_hex(&self) -> String {
        self.keys.public_key().to_hex()
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Connect to every configured relay. Fails unless at least one
    /// connection comes up; the caller may retry.
    pub async fn connect(&self) -> Result<(), Error> {
        if self.relays.is_empty() {
            return Err(Error::relay("no relay URLs configured"));
        }

        for url in &self.relays {
            self.client
                .add_relay(url.clone())
                .await
                .map_err(Error::relay)?;
        }
        self.client.connect().await;

        // Give the pool a moment to bring sockets up before counting.
        tokio::time::sleep(Duration::from_secs(2)).await;

        let connected = self
            .client
            .relays()
            .await
            .values()
            .filter(|relay| relay.is_connected())
            .count();
        self.stats
            .connections
            .store(connected as u64, Ordering::Relaxed);

        tracing::info!(
            connected,
            configured = self.relays.len(),
            "Connected to relays"
        );

        if connected == 0 {
            return Err(Error::relay("no relay connection could be established"));
        }
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.client.disconnect().await;
        tracing::info!("Disconnected from all relays");
    }

    /// Install one subscription per event kind, optionally narrowed to a set
    /// of authors.
    pub async fn subscribe(&self, kinds: &[u16], authors: Option<&[String]>) -> Result<(), Error> {
        for kind in kinds {
            let mut filter = Filter::new().kind(Kind::Custom(*kind));
            if let Some(authors) = authors {
                let authors = authors
                    .iter()
                    .map(|a| PublicKey::from_hex(a).map_err(Error::key))
                    .collect::<Result<Vec<_>, _>>()?;
                filter = filter.authors(authors);
            }

            self.client
                .subscribe(filter, None)
                .await
                .map_err(Error::relay)?;

            tracing::info!(kind, "Subscribed to event kind");
        }
        Ok(())
    }

    /// Sign and publish an event to all connected relays. Returns the event
    /// id.
    pub async fn publish_event(
        &self,
        kind: u16,
        content: String,
        recipient: Option<&str>,
    ) -> Result<String, Error> {
        let mut builder = EventBuilder::new(Kind::Custom(kind), content);
        if let Some(recipient) = recipient {
            let recipient = PublicKey::from_hex(recipient).map_err(Error::key)?;
            builder = builder.tag(Tag::public_key(recipient));
        }

        let event = builder.sign_with_keys(&self.keys).map_err(Error::event)?;
        let event_id = event.id.to_hex();

        self.client.send_event(&event).await.map_err(Error::relay)?;
        self.stats.events_published.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(kind, %event_id, "Published event");

        Ok(event_id)
    }

    /// NIP-04 encrypt `cleartext` for `recipient`.
    pub fn encrypt_dm(&self, recipient: &str, cleartext: &str) -> Result<String, Error> {
        let recipient = PublicKey::from_hex(recipient).map_err(Error::key)?;
        nip04::encrypt(self.keys.secret_key(), &recipient, cleartext).map_err(Error::dm)
    }

    /// NIP-04 decrypt `ciphertext` received from `sender`.
    pub fn decrypt_dm(&self, sender: &str, ciphertext: &str) -> Result<String, Error> {
        let sender = PublicKey::from_hex(sender).map_err(Error::key)?;
        nip04::decrypt(self.keys.secret_key(), &sender, ciphertext).map_err(Error::dm)
    }

    /// Subscribe to the raw notification stream consumed by the event loop.
    pub fn notifications(&self) -> broadcast::Receiver<RelayPoolNotification> {
        self.client.notifications()
    }

    pub(crate) fn note_received(&self) {
        self.stats.events_received.fetch_add(1, Ordering::Relaxed);
    }
}

/// Convert a relay-library event into the adapter's wire shape.
pub fn gateway_event_from(event: &nostr::Event) -> GatewayEvent {
    GatewayEvent {
        id: event.id.to_hex(),
        pubkey: event.pubkey.to_hex(),
        created_at: event.created_at.as_u64() as i64,
        kind: event.kind.as_u16(),
        tags: event
            .tags
            .iter()
            .map(|tag| tag.clone().to_vec())
            .collect(),
        content: event.content.clone(),
        sig: event.sig.to_string(),
    }
}
