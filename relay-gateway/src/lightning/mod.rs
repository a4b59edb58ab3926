//! Lightning lift (invoice-in, asset credit) and land (asset debit,
//! invoice-out) flows, layered on the ceremony orchestrator.

use crate::backends::AssetService;
use crate::backends::LightningService;
use crate::cache::ReadThroughCache;
use crate::config::Settings;
use crate::fees::estimate_lightning_fee;
use crate::jobs::Job;
use crate::jobs::JobKind;
use crate::jobs::JobQueue;
use crate::publisher::publish_failure;
use crate::publisher::publish_status;
use crate::publisher::publish_success;
use crate::publisher::OutboundPublisher;
use crate::store::SessionStore;
use bitcoin::hashes::sha256;
use bitcoin::hashes::Hash;
use lightning_invoice::Bolt11Invoice;
use relay_core::events;
use relay_core::now_unix;
use relay_core::Error;
use relay_core::ErrorKind;
use relay_core::IntentParams;
use relay_core::InvoiceStatus;
use relay_core::InvoiceType;
use relay_core::LightningInvoice;
use relay_core::SessionResult;
use relay_core::SessionState;
use relay_core::SigningSession;
use relay_grpc::InvoiceState;
use relay_grpc::InvoiceUpdate;
use relay_grpc::PaymentState;
use std::str::FromStr;
use std::sync::Arc;

pub mod monitor;
pub mod recovery;

pub use recovery::ErrorClass;
pub use recovery::RecoveryTracker;

pub struct LightningCoordinator<T, L, P> {
    store: SessionStore,
    asset: Arc<T>,
    lightning: Arc<L>,
    publisher: Arc<P>,
    cache: Arc<ReadThroughCache>,
    jobs: JobQueue,
    recovery: Arc<RecoveryTracker>,
    settings: Arc<Settings>,
}

impl<T, L, P> LightningCoordinator<T, L, P>
where
    T: AssetService,
    L: LightningService,
    P: OutboundPublisher,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: SessionStore,
        asset: Arc<T>,
        lightning: Arc<L>,
        publisher: Arc<P>,
        cache: Arc<ReadThroughCache>,
        jobs: JobQueue,
        recovery: Arc<RecoveryTracker>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            store,
            asset,
            lightning,
            publisher,
            cache,
            jobs,
            recovery,
            settings,
        }
    }

    /// Lift, prepare side: create the invoice the user must pay and park
    /// the session in `committing` until the settlement feed reports it
    /// paid. Runs with the session in `signing`.
    pub async fn execute_lift(&self, session: &SigningSession) -> Result<(), Error> {
        let IntentParams::LightningLift(params) = &session.intent.params else {
            return Err(Error::ad_hoc("lift flow invoked for a non-lift session"));
        };

        let now = now_unix();
        // The invoice must die no later than the session does.
        let expiry_seconds = self
            .settings
            .invoice_expiry_seconds
            .min((session.expires_at - now).max(60));

        let memo = format!("lift {} {}", params.amount, params.asset_id);
        let created = self
            .recovery
            .run("add_invoice", || {
                self.lightning
                    .add_invoice(params.amount, &memo, expiry_seconds)
            })
            .await?;

        self.store
            .create_invoice(&LightningInvoice {
                payment_hash: created.payment_hash.clone(),
                bolt11: created.bolt11.clone(),
                session_id: Some(session.session_id.clone()),
                amount_sats: params.amount,
                asset_id: params.asset_id.clone(),
                status: InvoiceStatus::Pending,
                invoice_type: InvoiceType::Lift,
                created_at: now,
                expires_at: now + expiry_seconds,
                paid_at: None,
            })
            .await?;

        if !self
            .store
            .update_session_state(
                &session.session_id,
                SessionState::Signing,
                SessionState::Committing,
            )
            .await?
        {
            return Err(Error::store_conflict("session left signing state mid-lift"));
        }
        self.cache.invalidate_session(&session.session_id).await;

        publish_status(
            self.publisher.as_ref(),
            &session.user_pubkey,
            &session.session_id,
            SessionState::Committing,
            Some("invoice_created"),
            Some(&created.bolt11),
        )
        .await;

        tracing::info!(
            session_id = %session.session_id,
            payment_hash = %created.payment_hash,
            "Lift invoice created, awaiting settlement"
        );

        Ok(())
    }

    /// Lift, settle side: driven by the invoice monitor when the feed
    /// reports SETTLED. Verifies the preimage, credits the asset and
    /// completes the session. Idempotent under re-delivery: the session's
    /// own terminal state is the gate, so a paid invoice whose credit is
    /// still owed (an earlier mint failure) is picked up again rather
    /// than skipped.
    pub async fn settle_lift(&self, update: &InvoiceUpdate) -> Result<(), Error> {
        if update.state != InvoiceState::Settled {
            return Ok(());
        }

        let Some(invoice) = self.store.get_invoice(&update.payment_hash).await? else {
            tracing::debug!(payment_hash = %update.payment_hash, "Settlement for unknown invoice");
            return Ok(());
        };
        if invoice.invoice_type != InvoiceType::Lift {
            return Ok(());
        }

        match invoice.status {
            InvoiceStatus::Failed | InvoiceStatus::Expired => return Ok(()),
            // Already recorded as paid; the credit below may still be owed.
            InvoiceStatus::Paid => {}
            InvoiceStatus::Pending | InvoiceStatus::PendingPayment => {
                verify_preimage(update)?;
                self.store
                    .update_invoice_status(
                        &update.payment_hash,
                        InvoiceStatus::Paid,
                        Some(now_unix()),
                    )
                    .await?;
            }
        }

        let Some(session_id) = invoice.session_id.as_deref() else {
            tracing::warn!(payment_hash = %update.payment_hash, "Paid lift invoice has no session");
            return Ok(());
        };
        let Some(session) = self.store.get_session(session_id).await? else {
            return Err(Error::ad_hoc(format!("session {session_id} missing for paid invoice")));
        };
        if session.state.is_terminal() {
            // Re-delivered settlement for a finished ceremony.
            return Ok(());
        }

        // Mint the asset credit. A failure here leaves a paid invoice on
        // file, so settlement is requeued rather than dropped.
        let mint = self
            .recovery
            .run("mint_asset", || {
                self.asset.mint_asset(&invoice.asset_id, invoice.amount_sats)
            })
            .await;
        if let Err(e) = mint {
            self.jobs
                .enqueue(Job::new(JobKind::RetrySettlement, &update.payment_hash))
                .await?;
            return Err(e);
        }

        let result = SessionResult::Success {
            txid: None,
            payment_hash: Some(update.payment_hash.clone()),
            amount: invoice.amount_sats,
            fee: 0,
        };

        if self
            .store
            .commit_lift(
                session_id,
                &session.user_pubkey,
                &invoice.asset_id,
                invoice.amount_sats,
                &result,
            )
            .await?
        {
            self.cache.invalidate_session(session_id).await;
            self.cache
                .invalidate_balance(&session.user_pubkey, &invoice.asset_id)
                .await;

            publish_success(
                self.publisher.as_ref(),
                &session.user_pubkey,
                &session.intent.action_id,
                events::SuccessResults {
                    txid: None,
                    payment_hash: Some(update.payment_hash.clone()),
                    amount: invoice.amount_sats,
                    fee: 0,
                },
            )
            .await;

            tracing::info!(session_id, payment_hash = %update.payment_hash, "Lift settled");
        } else {
            tracing::warn!(session_id, "Lift settlement lost the completion race");
        }

        Ok(())
    }

    /// Re-drive an invoice from the job queue. Lift invoices re-check the
    /// settlement feed's view; land invoices poll the outgoing payment and
    /// finish the ceremony either way.
    pub async fn retry_settlement(&self, payment_hash: &str) -> Result<(), Error> {
        let Some(invoice) = self.store.get_invoice(payment_hash).await? else {
            tracing::warn!(payment_hash, "Retrying settlement for unknown invoice");
            return Ok(());
        };

        match invoice.invoice_type {
            InvoiceType::Lift => {
                let Some(update) = self.lightning.lookup_invoice(payment_hash).await? else {
                    tracing::warn!(payment_hash, "Lift invoice unknown to the node");
                    return Ok(());
                };
                self.settle_lift(&update).await
            }
            InvoiceType::Land => self.poll_land_payment(&invoice).await,
        }
    }

    /// Resolve a land payment whose first attempt was still in flight.
    ///
    /// The session sits in `committing` with its reservation held until the
    /// node reports an outcome: COMPLETE commits the debit, FAILED fails
    /// the session and releases the reservation, anything else re-queues
    /// the poll until the invoice deadline bounds it.
    async fn poll_land_payment(&self, invoice: &LightningInvoice) -> Result<(), Error> {
        if invoice.status.is_terminal() {
            return Ok(());
        }
        let Some(session_id) = invoice.session_id.as_deref() else {
            tracing::warn!(payment_hash = %invoice.payment_hash, "Land invoice has no session");
            return Ok(());
        };
        let Some(session) = self.store.get_session(session_id).await? else {
            return Err(Error::ad_hoc(format!(
                "session {session_id} missing for land invoice"
            )));
        };
        let IntentParams::LightningLand(params) = &session.intent.params else {
            return Err(Error::ad_hoc("land invoice bound to a non-land session"));
        };

        let outcome = self.lightning.lookup_payment(&invoice.payment_hash).await?;
        match outcome {
            Some(outcome) if outcome.state == PaymentState::Complete => {
                self.store
                    .update_invoice_status(
                        &invoice.payment_hash,
                        InvoiceStatus::Paid,
                        Some(now_unix()),
                    )
                    .await?;

                let fee =
                    estimate_lightning_fee(params.amount, self.settings.fee_percentage)
                        .to_satoshis();
                let result = SessionResult::Success {
                    txid: None,
                    payment_hash: Some(invoice.payment_hash.clone()),
                    amount: params.amount,
                    fee: outcome.fee_sats,
                };

                if self
                    .store
                    .commit_land(
                        session_id,
                        &session.user_pubkey,
                        &params.asset_id,
                        params.amount + fee,
                        &result,
                    )
                    .await?
                {
                    self.cache.invalidate_session(session_id).await;
                    self.cache
                        .invalidate_balance(&session.user_pubkey, &params.asset_id)
                        .await;

                    publish_success(
                        self.publisher.as_ref(),
                        &session.user_pubkey,
                        &session.intent.action_id,
                        events::SuccessResults {
                            txid: None,
                            payment_hash: Some(invoice.payment_hash.clone()),
                            amount: params.amount,
                            fee: outcome.fee_sats,
                        },
                    )
                    .await;

                    tracing::info!(
                        session_id,
                        payment_hash = %invoice.payment_hash,
                        "Land payment completed on poll"
                    );
                } else {
                    // The session already terminalized (expiry sweep) while
                    // real sats left the node. Never swallow that.
                    tracing::error!(
                        session_id,
                        payment_hash = %invoice.payment_hash,
                        "Land payment completed but its session is terminal, debit not applied"
                    );
                }
                Ok(())
            }
            Some(outcome) if outcome.state == PaymentState::Failed => {
                self.store
                    .update_invoice_status(&invoice.payment_hash, InvoiceStatus::Failed, None)
                    .await?;

                let e = Error::new(
                    ErrorKind::PaymentFailed,
                    outcome
                        .failure_reason
                        .unwrap_or_else(|| "payment failed".to_string()),
                );
                self.fail_land_session(&session, &e).await;
                Ok(())
            }
            _ => {
                // Still in flight, or the node has no record yet. Keep
                // polling until the invoice deadline, then give up cleanly.
                if now_unix() > invoice.expires_at {
                    self.store
                        .update_invoice_status(&invoice.payment_hash, InvoiceStatus::Failed, None)
                        .await?;
                    let e = Error::new(
                        ErrorKind::PaymentFailed,
                        "payment did not complete before the invoice deadline",
                    );
                    self.fail_land_session(&session, &e).await;
                } else {
                    self.jobs
                        .enqueue(Job::new(JobKind::PollInvoice, &invoice.payment_hash))
                        .await?;
                }
                Ok(())
            }
        }
    }

    async fn fail_land_session(&self, session: &SigningSession, e: &Error) {
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

                tracing::info!(
                    session_id = %session.session_id,
                    code = e.kind().as_str(),
                    "Land session failed on poll"
                );
            }
            Ok(false) => {}
            Err(store_e) => {
                tracing::error!(
                    session_id = %session.session_id,
                    "Failed to record land session failure: {store_e}"
                );
            }
        }
    }

    /// Land: validate the user's invoice, pay it, and debit the asset only
    /// on COMPLETE. Runs with the session in `signing` and its inventory
    /// already reserved.
    pub async fn execute_land(&self, session: &SigningSession) -> Result<(), Error> {
        let IntentParams::LightningLand(params) = &session.intent.params else {
            return Err(Error::ad_hoc("land flow invoked for a non-land session"));
        };

        let invoice = Bolt11Invoice::from_str(&params.lightning_invoice).map_err(|e| {
            Error::new(ErrorKind::InvalidInvoice, format!("malformed BOLT-11 invoice: {e}"))
        })?;
        if invoice.is_expired() {
            return Err(Error::new(
                ErrorKind::InvoiceExpired,
                "lightning invoice already expired",
            ));
        }

        let payment_hash = invoice.payment_hash().to_string();
        if let Some(known) = self.lightning.lookup_invoice(&payment_hash).await? {
            if known.state == InvoiceState::Settled {
                return Err(Error::new(
                    ErrorKind::InvalidInvoice,
                    "lightning invoice is already paid",
                ));
            }
        }

        let fee = estimate_lightning_fee(params.amount, self.settings.fee_percentage).to_satoshis();
        let total_cost = params.amount + fee;

        // The reservation covered the amount; the fee must still fit.
        let balance = self
            .store
            .get_balance(&session.user_pubkey, &params.asset_id)
            .await?;
        if balance.available() < fee {
            return Err(Error::new(
                ErrorKind::InsufficientBalance,
                format!("balance cannot cover amount {} plus fee {fee}", params.amount),
            ));
        }

        let now = now_unix();
        self.store
            .create_invoice(&LightningInvoice {
                payment_hash: payment_hash.clone(),
                bolt11: params.lightning_invoice.clone(),
                session_id: Some(session.session_id.clone()),
                amount_sats: params.amount,
                asset_id: params.asset_id.clone(),
                status: InvoiceStatus::PendingPayment,
                invoice_type: InvoiceType::Land,
                created_at: now,
                expires_at: session.expires_at,
                paid_at: None,
            })
            .await?;

        if !self
            .store
            .update_session_state(
                &session.session_id,
                SessionState::Signing,
                SessionState::Committing,
            )
            .await?
        {
            return Err(Error::store_conflict("session left signing state mid-land"));
        }
        self.cache.invalidate_session(&session.session_id).await;

        publish_status(
            self.publisher.as_ref(),
            &session.user_pubkey,
            &session.session_id,
            SessionState::Committing,
            Some("paying_invoice"),
            None,
        )
        .await;

        let outcome = self
            .recovery
            .run("send_payment", || {
                self.lightning.send_payment(
                    &params.lightning_invoice,
                    params.amount,
                    self.settings.payment_timeout_seconds,
                )
            })
            .await?;

        match outcome.state {
            PaymentState::Complete => {
                self.store
                    .update_invoice_status(&payment_hash, InvoiceStatus::Paid, Some(now_unix()))
                    .await?;

                let result = SessionResult::Success {
                    txid: None,
                    payment_hash: Some(payment_hash.clone()),
                    amount: params.amount,
                    fee: outcome.fee_sats,
                };

                if self
                    .store
                    .commit_land(
                        &session.session_id,
                        &session.user_pubkey,
                        &params.asset_id,
                        total_cost,
                        &result,
                    )
                    .await?
                {
                    self.cache.invalidate_session(&session.session_id).await;
                    self.cache
                        .invalidate_balance(&session.user_pubkey, &params.asset_id)
                        .await;

                    publish_success(
                        self.publisher.as_ref(),
                        &session.user_pubkey,
                        &session.intent.action_id,
                        events::SuccessResults {
                            txid: None,
                            payment_hash: Some(payment_hash),
                            amount: params.amount,
                            fee: outcome.fee_sats,
                        },
                    )
                    .await;

                    tracing::info!(session_id = %session.session_id, "Land payment complete");
                }
                Ok(())
            }
            PaymentState::Failed => {
                self.store
                    .update_invoice_status(&payment_hash, InvoiceStatus::Failed, None)
                    .await?;
                Err(Error::new(
                    ErrorKind::PaymentFailed,
                    outcome
                        .failure_reason
                        .unwrap_or_else(|| "payment failed".to_string()),
                ))
            }
            PaymentState::InFlight => {
                // The node is still trying past our deadline and the outcome
                // is unknown. Failing now would release the reservation while
                // sats may still leave the node, so the session stays parked
                // in committing and the poll job settles it either way.
                self.jobs
                    .enqueue(Job::new(JobKind::PollInvoice, &payment_hash))
                    .await?;

                publish_status(
                    self.publisher.as_ref(),
                    &session.user_pubkey,
                    &session.session_id,
                    SessionState::Committing,
                    Some("payment_in_flight"),
                    None,
                )
                .await;

                tracing::warn!(
                    session_id = %session.session_id,
                    payment_hash = %payment_hash,
                    "Land payment still in flight, polling for its outcome"
                );
                Ok(())
            }
        }
    }
}

/// SHA-256 of the settlement preimage must be the payment hash.
fn verify_preimage(update: &InvoiceUpdate) -> Result<(), Error> {
    let Some(preimage) = update.preimage.as_deref() else {
        return Err(Error::invalid_signature(format!(
            "settlement for {} carries no preimage",
            update.payment_hash
        )));
    };

    let preimage = hex::decode(preimage)
        .map_err(|e| Error::invalid_signature(format!("preimage is not hex: {e}")))?;
    let digest = sha256::Hash::hash(&preimage).to_string();

    if digest != update.payment_hash {
        return Err(Error::invalid_signature(format!(
            "preimage does not match payment hash {}",
            update.payment_hash
        )));
    }
    Ok(())
}
