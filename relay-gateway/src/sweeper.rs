//! Periodic expiry sweep: sessions, challenges, VTXOs and invoices past
//! their deadlines get their transitions applied and compensation queued.

use crate::cache::ReadThroughCache;
use crate::jobs::Job;
use crate::jobs::JobKind;
use crate::jobs::JobQueue;
use crate::publisher::publish_failure;
use crate::publisher::OutboundPublisher;
use crate::store::SessionStore;
use relay_core::now_unix;
use relay_core::ErrorKind;
use relay_core::InvoiceStatus;
use relay_core::InvoiceType;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Sweeper<P> {
    store: SessionStore,
    publisher: Arc<P>,
    cache: Arc<ReadThroughCache>,
    jobs: JobQueue,
    interval: Duration,
}

impl<P: OutboundPublisher> Sweeper<P> {
    pub fn new(
        store: SessionStore,
        publisher: Arc<P>,
        cache: Arc<ReadThroughCache>,
        jobs: JobQueue,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            publisher,
            cache,
            jobs,
            interval,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval = ?self.interval, "Sweeper started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            if let Err(e) = self.sweep_once().await {
                tracing::error!("Sweep pass failed: {e}");
            }
        }

        tracing::info!("Sweeper stopped");
    }

    /// One full pass. Each expired entity is handled independently so one
    /// bad row cannot wedge the sweep.
    pub async fn sweep_once(&self) -> Result<(), relay_core::Error> {
        let now = now_unix();

        // Sessions past their deadline.
        for session in self.store.list_expired_sessions(now).await? {
            match self.store.expire_session(&session.session_id).await {
                Ok(true) => {
                    self.cache.invalidate_session(&session.session_id).await;
                    self.cache
                        .invalidate_balance(
                            &session.user_pubkey,
                            session.intent.params.asset_id(),
                        )
                        .await;

                    publish_failure(
                        self.publisher.as_ref(),
                        &session.user_pubkey,
                        &session.intent.action_id,
                        ErrorKind::ExpiredIntent,
                        "session expired before completion",
                    )
                    .await;

                    self.jobs
                        .enqueue(Job::new(JobKind::SweepSession, &session.session_id))
                        .await
                        .ok();

                    tracing::info!(
                        session_id = %session.session_id,
                        "Expired session swept"
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        session_id = %session.session_id,
                        "Failed to expire session: {e}"
                    );
                }
            }
        }

        // Inventory past its deadline leaves the selection pool.
        let expired_vtxos = self.store.expire_available_vtxos(now).await?;
        if expired_vtxos > 0 {
            tracing::info!(count = expired_vtxos, "Expired VTXOs removed from selection");
        }

        // Invoices past their deadline.
        for invoice in self.store.list_expired_invoices(now).await? {
            if let Err(e) = self.expire_invoice(&invoice).await {
                tracing::error!(
                    payment_hash = %invoice.payment_hash,
                    "Failed to expire invoice: {e}"
                );
            }
        }

        // Expired challenges of settled sessions are garbage.
        let dropped = self.store.delete_expired_challenges(now).await?;
        if dropped > 0 {
            tracing::debug!(count = dropped, "Dropped expired challenges");
        }

        Ok(())
    }

    async fn expire_invoice(
        &self,
        invoice: &relay_core::LightningInvoice,
    ) -> Result<(), relay_core::Error> {
        if !self
            .store
            .update_invoice_status(&invoice.payment_hash, InvoiceStatus::Expired, None)
            .await?
        {
            return Ok(());
        }

        // An unpaid lift invoice takes its session down with it.
        if invoice.invoice_type == InvoiceType::Lift {
            if let Some(session_id) = invoice.session_id.as_deref() {
                if let Some(session) = self.store.get_session(session_id).await? {
                    if !session.state.is_terminal()
                        && self
                            .store
                            .fail_session(
                                session_id,
                                ErrorKind::InvoiceExpired,
                                "lift invoice expired unpaid",
                            )
                            .await?
                    {
                        self.cache.invalidate_session(session_id).await;
                        publish_failure(
                            self.publisher.as_ref(),
                            &session.user_pubkey,
                            &session.intent.action_id,
                            ErrorKind::InvoiceExpired,
                            "lift invoice expired unpaid",
                        )
                        .await;
                    }
                }
            }
        }

        tracing::info!(payment_hash = %invoice.payment_hash, "Invoice expired");
        Ok(())
    }
}
