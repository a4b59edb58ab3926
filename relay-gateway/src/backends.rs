//! Traits at the back-end seam.
//!
//! The orchestrator and Lightning coordinator are generic over these so
//! tests can drive the whole ceremony against mocks; production wires in
//! the `relay-grpc` clients, whose retry and circuit-breaker behavior stays
//! inside the RPC shell.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use relay_core::Error;
use relay_core::Vtxo;
use relay_grpc::ArkTransaction;
use relay_grpc::AssetInfo;
use relay_grpc::CreatedInvoice;
use relay_grpc::InvoiceUpdate;
use relay_grpc::PaymentOutcome;
use relay_grpc::PreparedSigningRequest;
use relay_grpc::SessionStatus;
use relay_grpc::SubmitOutcome;

#[async_trait]
pub trait ArkService: Send + Sync + 'static {
    async fn create_vtxos(
        &self,
        asset_id: &str,
        amount: u64,
        count: u32,
    ) -> Result<Vec<Vtxo>, Error>;

    async fn spend_vtxos(
        &self,
        vtxo_ids: &[String],
        destination_pubkey: &str,
        amount: u64,
        asset_id: &str,
    ) -> Result<ArkTransaction, Error>;

    async fn prepare_signing_request(
        &self,
        session_id: &str,
        challenge_type: &str,
        context: &str,
    ) -> Result<PreparedSigningRequest, Error>;

    async fn submit_signatures(
        &self,
        session_id: &str,
        signatures: &[String],
    ) -> Result<SubmitOutcome, Error>;

    async fn get_session_status(&self, session_id: &str) -> Result<SessionStatus, Error>;
}

#[async_trait]
pub trait AssetService: Send + Sync + 'static {
    async fn list_assets(&self) -> Result<Vec<AssetInfo>, Error>;

    async fn mint_asset(&self, asset_id: &str, amount: u64) -> Result<String, Error>;

    async fn transfer_asset(
        &self,
        asset_id: &str,
        amount: u64,
        destination_pubkey: &str,
    ) -> Result<String, Error>;

    async fn create_asset_invoice(
        &self,
        asset_id: &str,
        amount: u64,
        memo: &str,
    ) -> Result<relay_grpc::AssetInvoice, Error>;

    async fn pay_asset_invoice(&self, invoice: &str, asset_id: &str) -> Result<String, Error>;
}

#[async_trait]
pub trait LightningService: Send + Sync + 'static {
    async fn add_invoice(
        &self,
        amount_sats: u64,
        memo: &str,
        expiry_seconds: i64,
    ) -> Result<CreatedInvoice, Error>;

    async fn lookup_invoice(&self, payment_hash: &str) -> Result<Option<InvoiceUpdate>, Error>;

    async fn send_payment(
        &self,
        bolt11: &str,
        amount_sats: u64,
        timeout_seconds: i64,
    ) -> Result<PaymentOutcome, Error>;

    /// Status of a payment previously sent by the node; `None` when the
    /// node has no record of it.
    async fn lookup_payment(&self, payment_hash: &str) -> Result<Option<PaymentOutcome>, Error>;

    async fn get_balance(&self) -> Result<relay_grpc::NodeBalance, Error>;

    /// Settlement event feed for the invoice monitor.
    async fn subscribe_invoices(
        &self,
    ) -> Result<BoxStream<'static, Result<InvoiceUpdate, Error>>, Error>;
}

#[async_trait]
impl ArkService for relay_grpc::ArkClient {
    async fn create_vtxos(
        &self,
        asset_id: &str,
        amount: u64,
        count: u32,
    ) -> Result<Vec<Vtxo>, Error> {
        relay_grpc::ArkClient::create_vtxos(self, asset_id, amount, count)
            .await
            .map_err(Into::into)
    }

    async fn spend_vtxos(
        &self,
        vtxo_ids: &[String],
        destination_pubkey: &str,
        amount: u64,
        asset_id: &str,
    ) -> Result<ArkTransaction, Error> {
        relay_grpc::ArkClient::spend_vtxos(self, vtxo_ids, destination_pubkey, amount, asset_id)
            .await
            .map_err(Into::into)
    }

    async fn prepare_signing_request(
        &self,
        session_id: &str,
        challenge_type: &str,
        context: &str,
    ) -> Result<PreparedSigningRequest, Error> {
        relay_grpc::ArkClient::prepare_signing_request(self, session_id, challenge_type, context)
            .await
            .map_err(Into::into)
    }

    async fn submit_signatures(
        &self,
        session_id: &str,
        signatures: &[String],
    ) -> Result<SubmitOutcome, Error> {
        relay_grpc::ArkClient::submit_signatures(self, session_id, signatures)
            .await
            .map_err(Into::into)
    }

    async fn get_session_status(&self, session_id: &str) -> Result<SessionStatus, Error> {
        relay_grpc::ArkClient::get_session_status(self, session_id)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl AssetService for relay_grpc::AssetClient {
    async fn list_assets(&self) -> Result<Vec<AssetInfo>, Error> {
        relay_grpc::AssetClient::list_assets(self).await.map_err(Into::into)
    }

    async fn mint_asset(&self, asset_id: &str, amount: u64) -> Result<String, Error> {
        relay_grpc::AssetClient::mint_asset(self, asset_id, amount)
            .await
            .map_err(Into::into)
    }

    async fn transfer_asset(
        &self,
        asset_id: &str,
        amount: u64,
        destination_pubkey: &str,
    ) -> Result<String, Error> {
        relay_grpc::AssetClient::transfer_asset(self, asset_id, amount, destination_pubkey)
            .await
            .map_err(Into::into)
    }

    async fn create_asset_invoice(
        &self,
        asset_id: &str,
        amount: u64,
        memo: &str,
    ) -> Result<relay_grpc::AssetInvoice, Error> {
        relay_grpc::AssetClient::create_asset_invoice(self, asset_id, amount, memo)
            .await
            .map_err(Into::into)
    }

    async fn pay_asset_invoice(&self, invoice: &str, asset_id: &str) -> Result<String, Error> {
        relay_grpc::AssetClient::pay_asset_invoice(self, invoice, asset_id)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl LightningService for relay_grpc::LightningClient {
    async fn add_invoice(
        &self,
        amount_sats: u64,
        memo: &str,
        expiry_seconds: i64,
    ) -> Result<CreatedInvoice, Error> {
        relay_grpc::LightningClient::add_invoice(self, amount_sats, memo, expiry_seconds)
            .await
            .map_err(Into::into)
    }

    async fn lookup_invoice(&self, payment_hash: &str) -> Result<Option<InvoiceUpdate>, Error> {
        relay_grpc::LightningClient::lookup_invoice(self, payment_hash)
            .await
            .map_err(Into::into)
    }

    async fn send_payment(
        &self,
        bolt11: &str,
        amount_sats: u64,
        timeout_seconds: i64,
    ) -> Result<PaymentOutcome, Error> {
        relay_grpc::LightningClient::send_payment(self, bolt11, amount_sats, timeout_seconds)
            .await
            .map_err(Into::into)
    }

    async fn lookup_payment(&self, payment_hash: &str) -> Result<Option<PaymentOutcome>, Error> {
        relay_grpc::LightningClient::lookup_payment(self, payment_hash)
            .await
            .map_err(Into::into)
    }

    async fn get_balance(&self) -> Result<relay_grpc::NodeBalance, Error> {
        relay_grpc::LightningClient::get_balance(self)
            .await
            .map_err(Into::into)
    }

    async fn subscribe_invoices(
        &self,
    ) -> Result<BoxStream<'static, Result<InvoiceUpdate, Error>>, Error> {
        let stream = relay_grpc::LightningClient::subscribe_invoices(self)
            .await
            .map_err(relay_core::Error::from)?;

        Ok(stream.map(|item| item.map_err(relay_core::Error::from)).boxed())
    }
}
