use crate::breaker::BreakerState;
use crate::breaker::CircuitBreaker;
use crate::breaker::CircuitBreakerConfig;
use crate::channel::build_channel;
use crate::channel::ConnectionConfig;
use crate::channel::RetryPolicy;
use crate::generated;
use crate::generated::lnd::v1::lightning_service_client::LightningServiceClient;
use crate::types::ChannelSummary;
use crate::types::CreatedInvoice;
use crate::types::InvoiceUpdate;
use crate::types::NodeBalance;
use crate::types::NodeInfo;
use crate::types::PaymentOutcome;
use crate::Error;
use async_stream::stream;
use backon::Retryable;
use futures::Stream;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use tonic::transport::Channel;

/// Client for the Lightning node: invoices, payments and channel state.
#[derive(Debug, Clone)]
pub struct LightningClient {
    config: ConnectionConfig,
    client: Arc<Mutex<LightningServiceClient<Channel>>>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl LightningClient {
    pub fn connect(
        config: ConnectionConfig,
        breaker_config: CircuitBreakerConfig,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let channel = build_channel(&config)?;
        let client = Self::wrap(channel, &config);

        tracing::info!(url = %config.url, "Connected to lnd");

        Ok(Self {
            config,
            client: Arc::new(Mutex::new(client)),
            breaker: Arc::new(CircuitBreaker::new("lnd", breaker_config)),
            retry,
        })
    }

    fn wrap(channel: Channel, config: &ConnectionConfig) -> LightningServiceClient<Channel> {
        LightningServiceClient::new(channel)
            .max_decoding_message_size(config.max_message_bytes)
            .max_encoding_message_size(config.max_message_bytes)
    }

    /// Rebuild the channel in place; in-flight calls keep the old one.
    pub fn reconnect(&self) -> Result<(), Error> {
        let channel = build_channel(&self.config)?;
        *self.lock_client() = Self::wrap(channel, &self.config);

        tracing::info!(url = %self.config.url, "Reconnected to lnd");

        Ok(())
    }

    fn lock_client(&self) -> MutexGuard<'_, LightningServiceClient<Channel>> {
        match self.client.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn clone_client(&self) -> LightningServiceClient<Channel> {
        self.lock_client().clone()
    }

    pub async fn breaker_state(&self) -> BreakerState {
        self.breaker.state().await
    }

    async fn execute<R, F, Fut>(&self, op: F) -> Result<R, Error>
    where
        F: Fn(LightningServiceClient<Channel>) -> Fut,
        Fut: Future<Output = Result<R, tonic::Status>>,
    {
        let attempt = || async {
            let client = self.clone_client();
            self.breaker
                .call(|| async { op(client).await.map_err(Error::request) })
                .await
        };

        attempt
            .retry(self.retry.backoff())
            .sleep(tokio::time::sleep)
            .when(Error::is_retryable)
            .notify(|err: &Error, dur: Duration| {
                tracing::warn!("Retrying lnd RPC after {dur:?}. Error: {err}");
            })
            .await
    }

    pub async fn get_node_info(&self) -> Result<NodeInfo, Error> {
        let response = self
            .execute(|mut client| async move {
                client
                    .get_info(generated::lnd::v1::GetInfoRequest {})
                    .await
                    .map(|r| r.into_inner())
            })
            .await?;

        Ok(NodeInfo {
            alias: response.alias,
            synced_to_chain: response.synced_to_chain,
            block_height: response.block_height,
        })
    }

    pub async fn add_invoice(
        &self,
        amount_sats: u64,
        memo: &str,
        expiry_seconds: i64,
    ) -> Result<CreatedInvoice, Error> {
        let request = generated::lnd::v1::AddInvoiceRequest {
            amount_sats,
            memo: memo.to_string(),
            expiry_seconds,
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.add_invoice(request).await.map(|r| r.into_inner()) }
            })
            .await?;

        Ok(CreatedInvoice {
            payment_hash: response.payment_hash,
            bolt11: response.bolt11,
        })
    }

    pub async fn lookup_invoice(&self, payment_hash: &str) -> Result<Option<InvoiceUpdate>, Error> {
        let request = generated::lnd::v1::LookupInvoiceRequest {
            payment_hash: payment_hash.to_string(),
        };

        let result = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.lookup_invoice(request).await.map(|r| r.into_inner()) }
            })
            .await;

        match result {
            Ok(invoice) => Ok(Some(InvoiceUpdate::from(invoice))),
            Err(e) => match e.status() {
                Some(status) if status.code() == tonic::Code::NotFound => Ok(None),
                _ => Err(e),
            },
        }
    }

    /// Pay a BOLT-11 invoice. The deadline passed here bounds the payment
    /// attempt on the node side; the channel's own call timeout must exceed
    /// it.
    pub async fn send_payment(
        &self,
        bolt11: &str,
        amount_sats: u64,
        timeout_seconds: i64,
    ) -> Result<PaymentOutcome, Error> {
        let request = generated::lnd::v1::SendPaymentRequest {
            bolt11: bolt11.to_string(),
            amount_sats,
            timeout_seconds,
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.send_payment(request).await.map(|r| r.into_inner()) }
            })
            .await?;

        Ok(PaymentOutcome::from(response))
    }

    /// Look up the status of a payment previously sent by this node.
    /// Returns `None` when the node has no record of the payment hash.
    pub async fn lookup_payment(
        &self,
        payment_hash: &str,
    ) -> Result<Option<PaymentOutcome>, Error> {
        let request = generated::lnd::v1::LookupPaymentRequest {
            payment_hash: payment_hash.to_string(),
        };

        let result = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.lookup_payment(request).await.map(|r| r.into_inner()) }
            })
            .await;

        match result {
            Ok(response) => Ok(Some(PaymentOutcome::from(response))),
            Err(e) => match e.status() {
                Some(status) if status.code() == tonic::Code::NotFound => Ok(None),
                _ => Err(e),
            },
        }
    }

    pub async fn list_channels(&self, active_only: bool) -> Result<Vec<ChannelSummary>, Error> {
        let response = self
            .execute(|mut client| async move {
                client
                    .list_channels(generated::lnd::v1::ListChannelsRequest { active_only })
                    .await
                    .map(|r| r.into_inner())
            })
            .await?;

        Ok(response
            .channels
            .into_iter()
            .map(|channel| ChannelSummary {
                channel_id: channel.channel_id,
                peer_pubkey: channel.peer_pubkey,
                capacity_sats: channel.capacity_sats,
                local_balance_sats: channel.local_balance_sats,
                remote_balance_sats: channel.remote_balance_sats,
                active: channel.active,
            })
            .collect())
    }

    pub async fn get_balance(&self) -> Result<NodeBalance, Error> {
        let response = self
            .execute(|mut client| async move {
                client
                    .get_balance(generated::lnd::v1::GetBalanceRequest {})
                    .await
                    .map(|r| r.into_inner())
            })
            .await?;

        Ok(NodeBalance {
            confirmed_sats: response.confirmed_sats,
            unconfirmed_sats: response.unconfirmed_sats,
            local_channel_sats: response.local_channel_sats,
            remote_channel_sats: response.remote_channel_sats,
        })
    }

    /// Open the settlement event stream the invoice monitor consumes.
    ///
    /// The stream ends when the server closes it or on the first transport
    /// error; the caller decides whether to resubscribe.
    pub async fn subscribe_invoices(
        &self,
    ) -> Result<impl Stream<Item = Result<InvoiceUpdate, Error>> + Send + 'static, Error> {
        let mut client = self.clone_client();
        let response = self
            .breaker
            .call(|| async move {
                client
                    .subscribe_invoices(generated::lnd::v1::InvoiceSubscription {})
                    .await
                    .map_err(Error::request)
            })
            .await?;

        let mut streaming = response.into_inner();

        Ok(stream! {
            loop {
                match streaming.message().await {
                    Ok(Some(invoice)) => yield Ok(InvoiceUpdate::from(invoice)),
                    Ok(None) => break,
                    Err(status) => {
                        yield Err(Error::request(status));
                        break;
                    }
                }
            }
        })
    }

    /// Single-shot probe used by the health fan-out. Never retries.
    pub async fn health_check(&self) -> bool {
        let mut client = self.clone_client();
        let result = self
            .breaker
            .call(|| async move {
                client
                    .get_info(generated::lnd::v1::GetInfoRequest {})
                    .await
                    .map_err(Error::request)
            })
            .await;

        match result {
            Ok(response) => response.into_inner().synced_to_chain,
            Err(e) => {
                tracing::error!("lnd health check failed: {e}");
                false
            }
        }
    }
}
