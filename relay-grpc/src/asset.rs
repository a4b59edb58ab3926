use crate::breaker::BreakerState;
use crate::breaker::CircuitBreaker;
use crate::breaker::CircuitBreakerConfig;
use crate::channel::build_channel;
use crate::channel::ConnectionConfig;
use crate::channel::RetryPolicy;
use crate::generated;
use crate::generated::tap::v1::asset_service_client::AssetServiceClient;
use crate::types::AssetInfo;
use crate::types::AssetInvoice;
use crate::Error;
use backon::Retryable;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use tonic::transport::Channel;

/// Client for the Taproot-asset daemon: issuance, transfer and asset
/// invoices.
#[derive(Debug, Clone)]
pub struct AssetClient {
    config: ConnectionConfig,
    client: Arc<Mutex<AssetServiceClient<Channel>>>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl AssetClient {
    pub fn connect(
        config: ConnectionConfig,
        breaker_config: CircuitBreakerConfig,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let channel = build_channel(&config)?;
        let client = Self::wrap(channel, &config);

        tracing::info!(url = %config.url, "Connected to tapd");

        Ok(Self {
            config,
            client: Arc::new(Mutex::new(client)),
            breaker: Arc::new(CircuitBreaker::new("tapd", breaker_config)),
            retry,
        })
    }

    fn wrap(channel: Channel, config: &ConnectionConfig) -> AssetServiceClient<Channel> {
        AssetServiceClient::new(channel)
            .max_decoding_message_size(config.max_message_bytes)
            .max_encoding_message_size(config.max_message_bytes)
    }

    /// Rebuild the channel in place; in-flight calls keep the old one.
    pub fn reconnect(&self) -> Result<(), Error> {
        let channel = build_channel(&self.config)?;
        *self.lock_client() = Self::wrap(channel, &self.config);

        tracing::info!(url = %self.config.url, "Reconnected to tapd");

        Ok(())
    }

    fn lock_client(&self) -> MutexGuard<'_, AssetServiceClient<Channel>> {
        match self.client.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn clone_client(&self) -> AssetServiceClient<Channel> {
        self.lock_client().clone()
    }

    pub async fn breaker_state(&self) -> BreakerState {
        self.breaker.state().await
    }

    async fn execute<R, F, Fut>(&self, op: F) -> Result<R, Error>
    where
        F: Fn(AssetServiceClient<Channel>) -> Fut,
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
                tracing::warn!("Retrying tapd RPC after {dur:?}. Error: {err}");
            })
            .await
    }

    pub async fn list_assets(&self) -> Result<Vec<AssetInfo>, Error> {
        let response = self
            .execute(|mut client| async move {
                client
                    .list_assets(generated::tap::v1::ListAssetsRequest {
                        include_spent: false,
                    })
                    .await
                    .map(|r| r.into_inner())
            })
            .await?;

        Ok(response
            .assets
            .into_iter()
            .map(|asset| AssetInfo {
                asset_id: asset.asset_id,
                name: asset.name,
                ticker: asset.ticker,
                total_supply: asset.total_supply,
            })
            .collect())
    }

    /// Mint `amount` new units of an existing asset. Returns the batch TXID.
    pub async fn mint_asset(&self, asset_id: &str, amount: u64) -> Result<String, Error> {
        let request = generated::tap::v1::MintAssetRequest {
            asset_id: asset_id.to_string(),
            amount,
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.mint_asset(request).await.map(|r| r.into_inner()) }
            })
            .await?;

        Ok(response.batch_txid)
    }

    /// Transfer asset units to a destination key. Returns the transfer TXID.
    pub async fn transfer_asset(
        &self,
        asset_id: &str,
        amount: u64,
        destination_pubkey: &str,
    ) -> Result<String, Error> {
        let request = generated::tap::v1::TransferAssetRequest {
            asset_id: asset_id.to_string(),
            amount,
            destination_pubkey: destination_pubkey.to_string(),
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.transfer_asset(request).await.map(|r| r.into_inner()) }
            })
            .await?;

        Ok(response.transfer_txid)
    }

    pub async fn create_asset_invoice(
        &self,
        asset_id: &str,
        amount: u64,
        memo: &str,
    ) -> Result<AssetInvoice, Error> {
        let request = generated::tap::v1::CreateAssetInvoiceRequest {
            asset_id: asset_id.to_string(),
            amount,
            memo: memo.to_string(),
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move {
                    client
                        .create_asset_invoice(request)
                        .await
                        .map(|r| r.into_inner())
                }
            })
            .await?;

        Ok(AssetInvoice {
            invoice: response.invoice,
            payment_hash: response.payment_hash,
        })
    }

    /// Pay an asset invoice. Returns the payment TXID.
    pub async fn pay_asset_invoice(&self, invoice: &str, asset_id: &str) -> Result<String, Error> {
        let request = generated::tap::v1::PayAssetInvoiceRequest {
            invoice: invoice.to_string(),
            asset_id: asset_id.to_string(),
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move {
                    client
                        .pay_asset_invoice(request)
                        .await
                        .map(|r| r.into_inner())
                }
            })
            .await?;

        Ok(response.payment_txid)
    }

    /// Single-shot probe used by the health fan-out. Never retries.
    pub async fn health_check(&self) -> bool {
        let mut client = self.clone_client();
        let result = self
            .breaker
            .call(|| async move {
                client
                    .get_info(generated::tap::v1::GetInfoRequest {})
                    .await
                    .map_err(Error::request)
            })
            .await;

        match result {
            Ok(response) => response.into_inner().synced,
            Err(e) => {
                tracing::error!("tapd health check failed: {e}");
                false
            }
        }
    }
}
