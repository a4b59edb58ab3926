use crate::generated;
use relay_core::Vtxo;
use relay_core::VtxoStatus;

/// Which daemon a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Ark,
    Asset,
    Lightning,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Ark => "arkd",
            ServiceKind::Asset => "tapd",
            ServiceKind::Lightning => "lnd",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ArkInfo {
    pub network: String,
    pub synced: bool,
}

/// An Ark transaction prepared by arkd, ready for signature submission.
#[derive(Debug, Clone)]
pub struct ArkTransaction {
    pub ark_tx: String,
    pub checkpoint_txs: Vec<String>,
    pub fee_amount: u64,
}

/// Signing material prepared by arkd for a session.
#[derive(Debug, Clone)]
pub struct PreparedSigningRequest {
    pub payload_to_sign: String,
    pub human_readable_context: String,
    pub expires_at: i64,
}

/// Back-end view of a session's commit progress. Used as the idempotency
/// check before re-submitting signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSessionStatus {
    Unknown,
    Pending,
    Committed,
    Failed,
}

impl BackendSessionStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => BackendSessionStatus::Pending,
            "committed" => BackendSessionStatus::Committed,
            "failed" => BackendSessionStatus::Failed,
            _ => BackendSessionStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub txid: String,
    pub status: BackendSessionStatus,
}

#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub status: BackendSessionStatus,
    pub txid: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub asset_id: String,
    pub name: String,
    pub ticker: String,
    pub total_supply: u64,
}

#[derive(Debug, Clone)]
pub struct AssetInvoice {
    pub invoice: String,
    pub payment_hash: String,
}

#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub alias: String,
    pub synced_to_chain: bool,
    pub block_height: u32,
}

#[derive(Debug, Clone)]
pub struct CreatedInvoice {
    pub payment_hash: String,
    pub bolt11: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceState {
    Open,
    Settled,
    Canceled,
    Accepted,
}

/// One element of the settlement event stream.
#[derive(Debug, Clone)]
pub struct InvoiceUpdate {
    pub payment_hash: String,
    pub bolt11: String,
    pub amount_sats: u64,
    pub state: InvoiceState,
    pub preimage: Option<String>,
    pub settled_at: Option<i64>,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    InFlight,
    Complete,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment_hash: String,
    pub preimage: Option<String>,
    pub fee_sats: u64,
    pub state: PaymentState,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChannelSummary {
    pub channel_id: String,
    pub peer_pubkey: String,
    pub capacity_sats: u64,
    pub local_balance_sats: u64,
    pub remote_balance_sats: u64,
    pub active: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct NodeBalance {
    pub confirmed_sats: u64,
    pub unconfirmed_sats: u64,
    pub local_channel_sats: u64,
    pub remote_channel_sats: u64,
}

pub(crate) fn vtxo_from_proto(vtxo: generated::ark::v1::Vtxo) -> Vtxo {
    let owner_pubkey = if vtxo.owner_pubkey.is_empty() {
        None
    } else {
        Some(vtxo.owner_pubkey)
    };
    Vtxo {
        vtxo_id: vtxo.vtxo_id,
        asset_id: vtxo.asset_id,
        amount: vtxo.amount,
        owner_pubkey,
        status: VtxoStatus::Available,
        reserved_by_session: None,
        created_at: vtxo.created_at,
        expires_at: vtxo.expires_at,
    }
}

impl From<generated::lnd::v1::Invoice> for InvoiceUpdate {
    fn from(invoice: generated::lnd::v1::Invoice) -> Self {
        let state = match invoice.state() {
            generated::lnd::v1::InvoiceState::Open => InvoiceState::Open,
            generated::lnd::v1::InvoiceState::Settled => InvoiceState::Settled,
            generated::lnd::v1::InvoiceState::Canceled => InvoiceState::Canceled,
            generated::lnd::v1::InvoiceState::Accepted => InvoiceState::Accepted,
        };
        let preimage = if invoice.preimage.is_empty() {
            None
        } else {
            Some(invoice.preimage.clone())
        };
        let settled_at = (invoice.settled_at > 0).then_some(invoice.settled_at);
        Self {
            payment_hash: invoice.payment_hash,
            bolt11: invoice.bolt11,
            amount_sats: invoice.amount_sats,
            state,
            preimage,
            settled_at,
            expires_at: invoice.expires_at,
        }
    }
}

impl From<generated::lnd::v1::SendPaymentResponse> for PaymentOutcome {
    fn from(response: generated::lnd::v1::SendPaymentResponse) -> Self {
        let state = match response.state() {
            generated::lnd::v1::PaymentState::InFlight => PaymentState::InFlight,
            generated::lnd::v1::PaymentState::Complete => PaymentState::Complete,
            generated::lnd::v1::PaymentState::Failed => PaymentState::Failed,
        };
        let preimage = if response.preimage.is_empty() {
            None
        } else {
            Some(response.preimage.clone())
        };
        let failure_reason = if response.failure_reason.is_empty() {
            None
        } else {
            Some(response.failure_reason.clone())
        };
        Self {
            payment_hash: response.payment_hash,
            preimage,
            fee_sats: response.fee_sats,
            state,
            failure_reason,
        }
    }
}
