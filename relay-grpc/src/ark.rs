use crate::breaker::BreakerState;
use crate::breaker::CircuitBreaker;
use crate::breaker::CircuitBreakerConfig;
use crate::channel::build_channel;
use crate::channel::ConnectionConfig;
use crate::channel::RetryPolicy;
use crate::generated;
use crate::generated::ark::v1::ark_service_client::ArkServiceClient;
use crate::types::vtxo_from_proto;
use crate::types::ArkInfo;
use crate::types::ArkTransaction;
use crate::types::BackendSessionStatus;
use crate::types::PreparedSigningRequest;
use crate::types::SessionStatus;
use crate::types::SubmitOutcome;
use crate::Error;
use backon::Retryable;
use relay_core::Vtxo;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use tonic::transport::Channel;

/// Client for the arkd daemon: VTXO management and transaction signing.
#[derive(Debug, Clone)]
pub struct ArkClient {
    config: ConnectionConfig,
    client: Arc<Mutex<ArkServiceClient<Channel>>>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl ArkClient {
    pub fn connect(
        config: ConnectionConfig,
        breaker_config: CircuitBreakerConfig,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let channel = build_channel(&config)?;
        let client = Self::wrap(channel, &config);

        tracing::info!(url = %config.url, "Connected to arkd");

        Ok(Self {
            config,
            client: Arc::new(Mutex::new(client)),
            breaker: Arc::new(CircuitBreaker::new("arkd", breaker_config)),
            retry,
        })
    }

    fn wrap(channel: Channel, config: &ConnectionConfig) -> ArkServiceClient<Channel> {
        ArkServiceClient::new(channel)
            .max_decoding_message_size(config.max_message_bytes)
            .max_encoding_message_size(config.max_message_bytes)
    }

    /// Rebuild the channel in place; in-flight calls keep the old one.
    pub fn reconnect(&self) -> Result<(), Error> {
        let channel = build_channel(&self.config)?;
        *self.lock_client() = Self::wrap(channel, &self.config);

        tracing::info!(url = %self.config.url, "Reconnected to arkd");

        Ok(())
    }

    fn lock_client(&self) -> MutexGuard<'_, ArkServiceClient<Channel>> {
        match self.client.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn clone_client(&self) -> ArkServiceClient<Channel> {
        self.lock_client().clone()
    }

    pub async fn breaker_state(&self) -> BreakerState {
        self.breaker.state().await
    }

    async fn execute<R, F, Fut>(&self, op: F) -> Result<R, Error>
    where
        F: Fn(ArkServiceClient<Channel>) -> Fut,
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
                tracing::warn!("Retrying arkd RPC after {dur:?}. Error: {err}");
            })
            .await
    }

    pub async fn get_info(&self) -> Result<ArkInfo, Error> {
        let response = self
            .execute(|mut client| async move {
                client
                    .get_info(generated::ark::v1::GetInfoRequest {})
                    .await
                    .map(|r| r.into_inner())
            })
            .await?;

        Ok(ArkInfo {
            network: response.network,
            synced: response.synced,
        })
    }

    pub async fn create_vtxos(
        &self,
        asset_id: &str,
        amount: u64,
        count: u32,
    ) -> Result<Vec<Vtxo>, Error> {
        let request = generated::ark::v1::CreateVtxosRequest {
            asset_id: asset_id.to_string(),
            amount,
            count,
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.create_vtxos(request).await.map(|r| r.into_inner()) }
            })
            .await?;

        Ok(response.vtxos.into_iter().map(vtxo_from_proto).collect())
    }

    pub async fn list_vtxos(
        &self,
        asset_id: Option<&str>,
        owner_pubkey: Option<&str>,
    ) -> Result<Vec<Vtxo>, Error> {
        let request = generated::ark::v1::ListVtxosRequest {
            asset_id: asset_id.unwrap_or_default().to_string(),
            owner_pubkey: owner_pubkey.unwrap_or_default().to_string(),
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.list_vtxos(request).await.map(|r| r.into_inner()) }
            })
            .await?;

        Ok(response.vtxos.into_iter().map(vtxo_from_proto).collect())
    }

    pub async fn spend_vtxos(
        &self,
        vtxo_ids: &[String],
        destination_pubkey: &str,
        amount: u64,
        asset_id: &str,
    ) -> Result<ArkTransaction, Error> {
        let request = generated::ark::v1::SpendVtxosRequest {
            vtxo_ids: vtxo_ids.to_vec(),
            destination_pubkey: destination_pubkey.to_string(),
            amount,
            asset_id: asset_id.to_string(),
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.spend_vtxos(request).await.map(|r| r.into_inner()) }
            })
            .await?;

        Ok(ArkTransaction {
            ark_tx: response.ark_tx,
            checkpoint_txs: response.checkpoint_txs,
            fee_amount: response.fee_amount,
        })
    }

    pub async fn prepare_signing_request(
        &self,
        session_id: &str,
        challenge_type: &str,
        context: &str,
    ) -> Result<PreparedSigningRequest, Error> {
        let request = generated::ark::v1::PrepareSigningRequest {
            session_id: session_id.to_string(),
            challenge_type: challenge_type.to_string(),
            context: context.to_string(),
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move { client.prepare_signing(request).await.map(|r| r.into_inner()) }
            })
            .await?;

        Ok(PreparedSigningRequest {
            payload_to_sign: response.payload_to_sign,
            human_readable_context: response.human_readable_context,
            expires_at: response.expires_at,
        })
    }

    pub async fn submit_signatures(
        &self,
        session_id: &str,
        signatures: &[String],
    ) -> Result<SubmitOutcome, Error> {
        let request = generated::ark::v1::SubmitSignaturesRequest {
            session_id: session_id.to_string(),
            signatures: signatures.to_vec(),
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move {
                    client
                        .submit_signatures(request)
                        .await
                        .map(|r| r.into_inner())
                }
            })
            .await?;

        Ok(SubmitOutcome {
            txid: response.txid,
            status: BackendSessionStatus::parse(&response.status),
        })
    }

    pub async fn get_session_status(&self, session_id: &str) -> Result<SessionStatus, Error> {
        let request = generated::ark::v1::GetSessionStatusRequest {
            session_id: session_id.to_string(),
        };

        let response = self
            .execute(|mut client| {
                let request = request.clone();
                async move {
                    client
                        .get_session_status(request)
                        .await
                        .map(|r| r.into_inner())
                }
            })
            .await?;

        let txid = (!response.txid.is_empty()).then_some(response.txid);

        Ok(SessionStatus {
            status: BackendSessionStatus::parse(&response.status),
            txid,
        })
    }

    /// Single-shot probe used by the health fan-out. Never retries.
    pub async fn health_check(&self) -> bool {
        let mut client = self.clone_client();
        let result = self
            .breaker
            .call(|| async move {
                client
                    .get_info(generated::ark::v1::GetInfoRequest {})
                    .await
                    .map_err(Error::request)
            })
            .await;

        match result {
            Ok(response) => response.into_inner().synced,
            Err(e) => {
                tracing::error!("arkd health check failed: {e}");
                false
            }
        }
    }
}
