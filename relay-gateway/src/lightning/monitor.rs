//! Background invoice monitor: consumes the Lightning settlement feed and
//! drives lift completions.

use crate::backends::AssetService;
use crate::backends::LightningService;
use crate::lightning::LightningCoordinator;
use crate::publisher::OutboundPublisher;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Run until shutdown: subscribe to settlement events, hand settled
/// invoices to the coordinator, resubscribe with a delay when the stream
/// drops.
pub async fn run_invoice_monitor<T, L, P>(
    coordinator: Arc<LightningCoordinator<T, L, P>>,
    lightning: Arc<L>,
    shutdown: CancellationToken,
) where
    T: AssetService,
    L: LightningService,
    P: OutboundPublisher,
{
    tracing::info!("Invoice monitor started");

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        match lightning.subscribe_invoices().await {
            Ok(mut stream) => loop {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    update = stream.next() => match update {
                        Some(Ok(update)) => {
                            if let Err(e) = coordinator.settle_lift(&update).await {
                                tracing::error!(
                                    payment_hash = %update.payment_hash,
                                    "Settlement handling failed: {e}"
                                );
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!("Settlement stream error: {e}");
                            break;
                        }
                        None => {
                            tracing::warn!("Settlement stream ended");
                            break;
                        }
                    }
                }
            },
            Err(e) => {
                tracing::warn!("Failed to subscribe to settlement events: {e}");
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(RESUBSCRIBE_DELAY) => {}
        }
    }

    tracing::info!("Invoice monitor stopped");
}
