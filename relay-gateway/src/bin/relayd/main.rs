use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use relay_core::events::KIND_INTENT;
use relay_core::events::KIND_RESPONSE;
use relay_gateway::jobs::JobKind;
use relay_gateway::lightning::monitor::run_invoice_monitor;
use relay_gateway::Inventory;
use relay_gateway::IntentHandler;
use relay_gateway::InMemoryKv;
use relay_gateway::JobQueue;
use relay_gateway::LightningCoordinator;
use relay_gateway::Orchestrator;
use relay_gateway::ReadThroughCache;
use relay_gateway::RecoveryTracker;
use relay_gateway::ResponseHandler;
use relay_gateway::SessionStore;
use relay_gateway::Settings;
use relay_gateway::Sweeper;
use relay_grpc::ArkClient;
use relay_grpc::AssetClient;
use relay_grpc::ClientManager;
use relay_grpc::LightningClient;
use relay_nostr::run_event_loop;
use relay_nostr::EventDispatcher;
use relay_nostr::RelayClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "relayd")]
#[command(about = "Relay gateway between wallets and the Ark/asset/Lightning daemons")]
struct Cli {
    /// Log at debug level instead of info.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Arc::new(Settings::from_env().context("loading settings")?);

    // The store is the only dependency the process cannot run without.
    let store = SessionStore::new(&settings.database_path)
        .await
        .context("opening session store")?;

    let ark = Arc::new(
        ArkClient::connect(
            settings.connection_config(&settings.arkd),
            settings.breaker,
            settings.retry,
        )
        .context("connecting arkd client")?,
    );
    let asset = Arc::new(
        AssetClient::connect(
            settings.connection_config(&settings.tapd),
            settings.breaker,
            settings.retry,
        )
        .context("connecting tapd client")?,
    );
    let lightning = Arc::new(
        LightningClient::connect(
            settings.connection_config(&settings.lnd),
            settings.breaker,
            settings.retry,
        )
        .context("connecting lnd client")?,
    );
    let manager = ClientManager::new(
        ark.as_ref().clone(),
        asset.as_ref().clone(),
        lightning.as_ref().clone(),
    );

    let relay = RelayClient::new(
        settings.relay_urls.clone(),
        settings.gateway_identity_key.as_deref(),
    )
    .map_err(|e| anyhow::anyhow!("building relay client: {e}"))?;
    relay
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("connecting to relays: {e}"))?;
    let relay = Arc::new(relay);

    let kv = Arc::new(InMemoryKv::new());
    let cache = Arc::new(ReadThroughCache::new(kv.clone(), settings.cache_ttl));
    let jobs = JobQueue::new(kv);
    let recovery = Arc::new(RecoveryTracker::default());
    let shutdown = CancellationToken::new();

    let coordinator = Arc::new(LightningCoordinator::new(
        store.clone(),
        asset.clone(),
        lightning.clone(),
        relay.clone(),
        cache.clone(),
        jobs.clone(),
        recovery,
        settings.clone(),
    ));
    let inventory = Arc::new(Inventory::new(
        store.clone(),
        ark.clone(),
        settings.vtxo_min_amount,
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        ark,
        inventory,
        coordinator.clone(),
        relay.clone(),
        cache.clone(),
        settings.clone(),
        shutdown.clone(),
    ));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(KIND_INTENT, Arc::new(IntentHandler::new(orchestrator.clone())));
    dispatcher.register(
        KIND_RESPONSE,
        Arc::new(ResponseHandler::new(orchestrator.clone(), relay.clone())),
    );
    let dispatcher = Arc::new(dispatcher);

    relay
        .subscribe(&[KIND_INTENT, KIND_RESPONSE], None)
        .await
        .map_err(|e| anyhow::anyhow!("subscribing to event kinds: {e}"))?;

    let listener = tokio::spawn(run_event_loop(
        relay.as_ref().clone(),
        dispatcher,
        shutdown.clone(),
    ));

    let sweeper = Sweeper::new(
        store.clone(),
        relay.clone(),
        cache,
        jobs.clone(),
        settings.sweep_interval,
    );
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    let monitor_task = tokio::spawn(run_invoice_monitor(
        coordinator.clone(),
        lightning,
        shutdown.clone(),
    ));

    let worker_task = tokio::spawn(run_job_worker(jobs, coordinator, store, shutdown.clone()));

    let health_shutdown = shutdown.clone();
    let health_interval = settings.health_check_interval;
    let health_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = health_shutdown.cancelled() => break,
                _ = tokio::time::sleep(health_interval) => {}
            }
            let report = manager.health_check_all().await;
            tracing::debug!(
                ark = report.ark,
                asset = report.asset,
                lightning = report.lightning,
                "Health probe"
            );
        }
    });

    tracing::info!(pubkey = %relay.public_key_hex(), "Gateway up");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    shutdown.cancel();
    if let Err(e) = orchestrator.fail_inflight_for_shutdown().await {
        tracing::error!("Failing in-flight sessions on shutdown: {e}");
    }

    // Committing sessions get to finish their current step, bounded by the
    // RPC deadline.
    let drain = async {
        let _ = tokio::join!(
            listener,
            sweeper_task,
            monitor_task,
            worker_task,
            health_task
        );
    };
    if tokio::time::timeout(settings.rpc_timeout + Duration::from_secs(5), drain)
        .await
        .is_err()
    {
        tracing::warn!("Background tasks did not drain before the deadline");
    }

    relay.disconnect().await;
    tracing::info!("Gateway stopped");

    Ok(())
}

/// Drain the deferred-work queue. Jobs are idempotent, so crashing between
/// dequeue and completion only costs a redo.
async fn run_job_worker(
    jobs: JobQueue,
    coordinator: Arc<LightningCoordinator<AssetClient, LightningClient, RelayClient>>,
    store: SessionStore,
    shutdown: CancellationToken,
) {
    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let job = match jobs.dequeue().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => continue,
                }
            }
            Err(e) => {
                tracing::error!("Job dequeue failed: {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        let outcome = match job.kind {
            // retry_settlement branches on the stored invoice type: lift
            // invoices re-check the settlement feed, land invoices poll the
            // outgoing payment.
            JobKind::RetrySettlement | JobKind::PollInvoice => {
                coordinator.retry_settlement(&job.target).await
            }
            JobKind::SweepSession => store
                .release_reservation(&job.target)
                .await
                .map(|released| {
                    if released > 0 {
                        tracing::warn!(
                            session_id = %job.target,
                            released,
                            "Sweep compensation released stragglers"
                        );
                    }
                }),
        };

        if let Err(e) = outcome {
            tracing::error!(operation = %job.operation_key(), "Job failed: {e}");
        }

        // Pace the queue: a poll job that re-enqueues itself must not spin.
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "debug,hyper=info,h2=warn,tower=info,rustls=info,sqlx=warn"
    } else {
        "info,h2=warn,sqlx=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).init()
}
