//! The ceremony orchestrator: owns the session state machine from intent
//! arrival to terminal outcome.
//!
//! Each step either advances the session or leaves it in its pre-step
//! state; compensation (releasing reservations, rolling back balance
//! deltas) is built into the store's terminal transitions. Concurrency is
//! per-session: one driver may advance a given session at a time, and
//! conditional state updates make duplicate deliveries lose their race
//! harmlessly.

use crate::backends::ArkService;
use crate::backends::AssetService;
use crate::backends::LightningService;
use crate::cache::ReadThroughCache;
use crate::challenge::generate_challenge;
use crate::challenge::verify_signing_response;
use crate::config::Settings;
use crate::inventory::Inventory;
use crate::lightning::LightningCoordinator;
use crate::publisher::publish_failure;
use crate::publisher::publish_status;
use crate::publisher::publish_success;
use crate::publisher::OutboundPublisher;
use crate::store::SessionStore;
use relay_core::canonical;
use relay_core::events;
use relay_core::now_unix;
use relay_core::Error;
use relay_core::ErrorKind;
use relay_core::Intent;
use relay_core::SessionResult;
use relay_core::SessionState;
use relay_core::SessionType;
use relay_core::SigningSession;
use relay_grpc::BackendSessionStatus;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One async mutex per live session. No driver ever holds two.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            map.entry(session_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop the lock entry of a terminal session.
    pub fn forget(&self, session_id: &str) {
        let mut map = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.remove(session_id);
    }
}

pub struct Orchestrator<A: ArkService, T, L, P> {
    store: SessionStore,
    ark: Arc<A>,
    inventory: Arc<Inventory<A>>,
    coordinator: Arc<LightningCoordinator<T, L, P>>,
    publisher: Arc<P>,
    cache: Arc<ReadThroughCache>,
    settings: Arc<Settings>,
    locks: SessionLocks,
    shutdown: CancellationToken,
}

impl<A, T, L, P> Orchestrator<A, T, L, P>
where
    A: ArkService,
    T: AssetService,
    L: LightningService,
    P: OutboundPublisher,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: SessionStore,
        ark: Arc<A>,
        inventory: Arc<Inventory<A>>,
        coordinator: Arc<LightningCoordinator<T, L, P>>,
        publisher: Arc<P>,
        cache: Arc<ReadThroughCache>,
        settings: Arc<Settings>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            ark,
            inventory,
            coordinator,
            publisher,
            cache,
            settings,
            locks: SessionLocks::default(),
            shutdown,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Intent arrival: validate, create the session, send the challenge.
    ///
    /// Returns the session id, which for a replayed `action_id` is the
    /// existing session rather than a new one.
    pub async fn handle_intent(&self, user_pubkey: &str, content: &str) -> Result<String, Error> {
        if self.shutdown.is_cancelled() {
            return Err(Error::new(ErrorKind::Shutdown, "gateway is shutting down"));
        }

        let now = now_unix();

        let intent = match Intent::from_content(content) {
            Ok(intent) => intent,
            Err(e) => {
                // Best effort: name the action in the failure event if the
                // envelope was readable enough to carry one.
                if let Some(action_id) = extract_action_id(content) {
                    publish_failure(
                        self.publisher.as_ref(),
                        user_pubkey,
                        &action_id,
                        e.kind(),
                        e.message(),
                    )
                    .await;
                }
                return Err(e);
            }
        };

        // An expired intent never creates a session.
        if let Err(e) = intent.check_not_expired(now) {
            publish_failure(
                self.publisher.as_ref(),
                user_pubkey,
                &intent.action_id,
                e.kind(),
                e.message(),
            )
            .await;
            return Err(e);
        }

        // Replaying an action id returns the session it already created.
        if let Some(existing) = self.store.get_session_by_action_id(&intent.action_id).await? {
            tracing::info!(
                action_id = %intent.action_id,
                session_id = %existing.session_id,
                "Duplicate intent, returning existing session"
            );
            return Ok(existing.session_id);
        }

        // Admission control.
        let active = self.store.count_active_sessions().await?;
        if active >= self.settings.max_concurrent_sessions {
            let e = Error::new(
                ErrorKind::RateLimited,
                format!("gateway is at its session limit ({active})"),
            );
            publish_failure(
                self.publisher.as_ref(),
                user_pubkey,
                &intent.action_id,
                e.kind(),
                e.message(),
            )
            .await;
            return Err(e);
        }

        let session = SigningSession {
            session_id: Uuid::new_v4().to_string(),
            user_pubkey: user_pubkey.to_string(),
            session_type: intent.session_type,
            state: SessionState::Initiated,
            context: intent.human_context(),
            created_at: now,
            updated_at: now,
            expires_at: now + self.settings.session_ttl_seconds(),
            challenge_id: None,
            result: None,
            intent,
        };

        if let Err(e) = self.store.create_session(&session).await {
            // Two deliveries of the same intent can race past the replay
            // check; the unique action_id index picks the winner.
            if e.kind() == ErrorKind::StoreConflict {
                if let Some(existing) = self
                    .store
                    .get_session_by_action_id(&session.intent.action_id)
                    .await?
                {
                    return Ok(existing.session_id);
                }
            }
            return Err(e);
        }

        let session_id = session.session_id.clone();
        let _guard = self.locks.acquire(&session_id).await;

        // Balance validation for flows that spend the user's assets.
        if matches!(
            session.session_type,
            SessionType::P2pTransfer | SessionType::LightningLand
        ) {
            let params = &session.intent.params;
            let balance = self
                .store
                .get_balance(user_pubkey, params.asset_id())
                .await?;
            if !balance.can_spend(params.amount()) {
                let e = Error::new(
                    ErrorKind::InsufficientBalance,
                    format!(
                        "available {} of {} {}",
                        balance.available(),
                        params.amount(),
                        params.asset_id()
                    ),
                );
                self.fail_and_publish(&session, &e).await;
                return Ok(session_id);
            }
        }

        // Generate and persist the challenge; session -> challenge_sent.
        let challenge = generate_challenge(
            &session.intent,
            &session_id,
            &session.context,
            now,
            self.settings.challenge_ttl_seconds(),
            session.expires_at,
        );
        if !self.store.create_challenge(&challenge).await? {
            return Err(Error::store_conflict(
                "session left initiated state before challenge creation",
            ));
        }
        self.cache.invalidate_session(&session_id).await;

        let content = events::ChallengeContent {
            challenge_id: challenge.challenge_id.clone(),
            payload_to_sign: canonical::payload_to_sign(&challenge.payload_ref),
            payload_ref: challenge.payload_ref.clone(),
            context: challenge.context.clone(),
            expires_at: challenge.expires_at,
        };
        let content = serde_json::to_string(&content)
            .map_err(|e| Error::ad_hoc(format!("failed to serialize challenge event: {e}")))?;
        self.publisher
            .publish(events::KIND_CHALLENGE, content, user_pubkey)
            .await?;

        tracing::info!(
            session_id = %session_id,
            challenge_id = %challenge.challenge_id,
            session_type = session.session_type.as_str(),
            "Session created, challenge sent"
        );

        Ok(session_id)
    }

    /// Signing response arrival: verify the signature and drive the session
    /// to its terminal state.
    pub async fn handle_signing_response(
        &self,
        sender_pubkey: &str,
        challenge_id: &str,
        signature: &str,
    ) -> Result<(), Error> {
        if self.shutdown.is_cancelled() {
            return Err(Error::new(ErrorKind::Shutdown, "gateway is shutting down"));
        }

        let challenge = self.store.get_challenge(challenge_id).await?.ok_or_else(|| {
            Error::new(
                ErrorKind::ChallengeNotFound,
                format!("challenge {challenge_id} not found"),
            )
        })?;

        let _guard = self.locks.acquire(&challenge.session_id).await;

        let session = self
            .store
            .get_session(&challenge.session_id)
            .await?
            .ok_or_else(|| Error::ad_hoc("challenge points at a missing session"))?;

        // A response from anyone but the session owner is noise, not a
        // reason to fail the owner's session.
        if session.user_pubkey != sender_pubkey {
            tracing::warn!(
                session_id = %session.session_id,
                sender = sender_pubkey,
                "Signing response from a foreign key ignored"
            );
            return Err(Error::invalid_signature(
                "response signed by a key that does not own the session",
            ));
        }

        if session.state.is_terminal() {
            return Err(Error::new(
                ErrorKind::ChallengeAlreadyUsed,
                "session already reached a terminal state",
            ));
        }

        // The duplicate-response race is decided here: only one delivery
        // moves challenge_sent -> awaiting_signature.
        if !self
            .store
            .update_session_state(
                &session.session_id,
                SessionState::ChallengeSent,
                SessionState::AwaitingSignature,
            )
            .await?
        {
            return Err(Error::new(
                ErrorKind::ChallengeAlreadyUsed,
                "a response for this session is already being processed",
            ));
        }
        self.cache.invalidate_session(&session.session_id).await;

        let now = now_unix();
        let used = match verify_signing_response(
            &self.store,
            challenge_id,
            signature,
            &session.user_pubkey,
            now,
        )
        .await
        {
            Ok(used) => used,
            Err(e) => {
                self.fail_and_publish(&session, &e).await;
                return Err(e);
            }
        };

        if !self
            .store
            .update_session_state(
                &session.session_id,
                SessionState::AwaitingSignature,
                SessionState::Signing,
            )
            .await?
        {
            let e = Error::store_conflict("session left awaiting_signature unexpectedly");
            self.fail_and_publish(&session, &e).await;
            return Err(e);
        }
        self.cache.invalidate_session(&session.session_id).await;

        publish_status(
            self.publisher.as_ref(),
            &session.user_pubkey,
            &session.session_id,
            SessionState::Signing,
            None,
            None,
        )
        .await;

        let signature = used
            .signature
            .unwrap_or_else(|| signature.to_string());

        self.drive(session, &signature).await
    }

    /// Steps 5 through 9: reserve, prepare, submit, finalize, publish.
    async fn drive(&self, session: SigningSession, signature: &str) -> Result<(), Error> {
        if self.shutdown.is_cancelled() {
            let e = Error::new(ErrorKind::Shutdown, "gateway is shutting down");
            self.fail_and_publish(&session, &e).await;
            return Err(e);
        }

        let result = match session.session_type {
            SessionType::P2pTransfer => self.execute_transfer(&session, signature).await,
            SessionType::LightningLift => self.coordinator.execute_lift(&session).await,
            SessionType::LightningLand => {
                match self.reserve_for(&session).await {
                    Ok(()) => self.coordinator.execute_land(&session).await,
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e) = &result {
            self.fail_and_publish(&session, e).await;
        }
        result
    }

    async fn reserve_for(&self, session: &SigningSession) -> Result<(), Error> {
        let params = &session.intent.params;
        self.inventory
            .reserve(
                &session.user_pubkey,
                params.asset_id(),
                params.amount(),
                &session.session_id,
            )
            .await?;
        self.cache
            .invalidate_balance(&session.user_pubkey, params.asset_id())
            .await;
        Ok(())
    }

    async fn execute_transfer(
        &self,
        session: &SigningSession,
        signature: &str,
    ) -> Result<(), Error> {
        let relay_core::IntentParams::P2pTransfer(params) = &session.intent.params else {
            return Err(Error::ad_hoc("transfer flow invoked for a non-transfer session"));
        };

        // Step 5: reserve inventory.
        self.reserve_for(session).await?;
        let reserved = self.store.list_vtxos_for_session(&session.session_id).await?;
        let vtxo_ids: Vec<String> = reserved.iter().map(|v| v.vtxo_id.clone()).collect();

        // Step 6: prepare the back-end transaction.
        let _prepared = self
            .ark
            .prepare_signing_request(&session.session_id, "p2p_transfer", &session.context)
            .await?;
        let ark_tx = self
            .ark
            .spend_vtxos(
                &vtxo_ids,
                &params.recipient_pubkey,
                params.amount,
                &params.asset_id,
            )
            .await?;

        // Step 7: submit. From here on the session is committing and a
        // shutdown lets it finish its current step.
        if !self
            .store
            .update_session_state(
                &session.session_id,
                SessionState::Signing,
                SessionState::Committing,
            )
            .await?
        {
            return Err(Error::store_conflict("session left signing state mid-transfer"));
        }
        self.cache.invalidate_session(&session.session_id).await;

        publish_status(
            self.publisher.as_ref(),
            &session.user_pubkey,
            &session.session_id,
            SessionState::Committing,
            None,
            None,
        )
        .await;

        // Exactly-once: ask the back end about this session before
        // submitting, so an ambiguous earlier attempt is never repeated.
        let known = self.ark.get_session_status(&session.session_id).await?;
        let txid = match known.status {
            BackendSessionStatus::Committed => known
                .txid
                .ok_or_else(|| Error::ad_hoc("back end reports committed without a txid"))?,
            BackendSessionStatus::Failed => {
                return Err(Error::new(
                    ErrorKind::ServiceProtocolError,
                    "back end already failed this session",
                ));
            }
            BackendSessionStatus::Unknown | BackendSessionStatus::Pending => {
                let outcome = self
                    .ark
                    .submit_signatures(&session.session_id, &[signature.to_string()])
                    .await?;
                outcome.txid
            }
        };

        // Step 8: finalize atomically.
        let result = SessionResult::Success {
            txid: Some(txid.clone()),
            payment_hash: None,
            amount: params.amount,
            fee: ark_tx.fee_amount,
        };

        if self
            .store
            .commit_transfer(
                &session.session_id,
                &session.user_pubkey,
                &params.recipient_pubkey,
                &params.asset_id,
                params.amount,
                &result,
            )
            .await?
        {
            self.cache.invalidate_session(&session.session_id).await;
            self.cache
                .invalidate_balance(&session.user_pubkey, &params.asset_id)
                .await;
            self.cache
                .invalidate_balance(&params.recipient_pubkey, &params.asset_id)
                .await;

            // Step 9: publish the outcome.
            publish_success(
                self.publisher.as_ref(),
                &session.user_pubkey,
                &session.intent.action_id,
                events::SuccessResults {
                    txid: Some(txid),
                    payment_hash: None,
                    amount: params.amount,
                    fee: ark_tx.fee_amount,
                },
            )
            .await;

            self.locks.forget(&session.session_id);
            tracing::info!(session_id = %session.session_id, "Transfer completed");
        } else {
            tracing::warn!(
                session_id = %session.session_id,
                "Transfer finalization lost the state race"
            );
        }

        Ok(())
    }

    /// Terminalize a session as failed and notify the user. Compensation
    /// (reservation release, balance rollback) rides in the store
    /// transaction; a session already terminal is left untouched.
    async fn fail_and_publish(&self, session: &SigningSession, e: &Error) {
        match self
            .store
            .fail_session(&session.session_id, e.kind(), e.message())
            .await
        {
            Ok(true) => {
                self.cache.invalidate_session(&session.session_id).await;
                self.cache
                    .invalidate_balance(&session.user_pubkey, session.intent.params.asset_id())
                    .await;

                publish_failure(
                    self.publisher.as_ref(),
                    &session.user_pubkey,
                    &session.intent.action_id,
                    e.kind(),
                    e.message(),
                )
                .await;

                self.locks.forget(&session.session_id);
                tracing::info!(
                    session_id = %session.session_id,
                    code = e.kind().as_str(),
                    "Session failed"
                );
            }
            Ok(false) => {
                tracing::debug!(
                    session_id = %session.session_id,
                    "Session already terminal, not failing again"
                );
            }
            Err(store_e) => {
                tracing::error!(
                    session_id = %session.session_id,
                    "Failed to record session failure: {store_e}"
                );
            }
        }
    }

    /// Shutdown path: fail every live session that has not reached
    /// `committing`; committing sessions are left to finish their step.
    pub async fn fail_inflight_for_shutdown(&self) -> Result<(), Error> {
        let live = self.store.list_live_sessions().await?;
        for session in live {
            if session.state == SessionState::Committing {
                continue;
            }
            let e = Error::new(ErrorKind::Shutdown, "gateway shut down mid-session");
            self.fail_and_publish(&session, &e).await;
        }
        Ok(())
    }
}

fn extract_action_id(content: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    value
        .get("action_id")
        .and_then(|v| v.as_str())
        .map(String::from)
}
