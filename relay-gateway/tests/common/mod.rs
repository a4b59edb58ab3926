#![allow(dead_code)]

//! Shared test fixtures: mock back ends, a capturing publisher and a
//! fully wired orchestrator over an in-memory store.

use async_trait::async_trait;
use bitcoin::hashes::sha256;
use bitcoin::hashes::Hash;
use bitcoin::key::Keypair;
use bitcoin::key::Secp256k1;
use bitcoin::secp256k1::rand::thread_rng;
use bitcoin::secp256k1::Message;
use futures::stream::BoxStream;
use futures::StreamExt;
use relay_core::now_unix;
use relay_core::Error;
use relay_core::ErrorKind;
use relay_core::Vtxo;
use relay_core::VtxoStatus;
use relay_gateway::backends::ArkService;
use relay_gateway::backends::AssetService;
use relay_gateway::backends::LightningService;
use relay_gateway::publisher::OutboundPublisher;
use relay_gateway::InMemoryKv;
use relay_gateway::Inventory;
use relay_gateway::JobQueue;
use relay_gateway::LightningCoordinator;
use relay_gateway::Orchestrator;
use relay_gateway::ReadThroughCache;
use relay_gateway::RecoveryTracker;
use relay_gateway::SessionStore;
use relay_gateway::Settings;
use relay_grpc::ArkTransaction;
use relay_grpc::AssetInfo;
use relay_grpc::AssetInvoice;
use relay_grpc::BackendSessionStatus;
use relay_grpc::CreatedInvoice;
use relay_grpc::InvoiceState;
use relay_grpc::InvoiceUpdate;
use relay_grpc::NodeBalance;
use relay_grpc::PaymentOutcome;
use relay_grpc::PaymentState;
use relay_grpc::PreparedSigningRequest;
use relay_grpc::SessionStatus;
use relay_grpc::SubmitOutcome;
use std::collections::HashMap;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Default)]
pub struct MockArk {
    /// submit_signatures invocations per session id.
    pub submit_calls: Mutex<HashMap<String, u32>>,
    /// Remaining submit attempts to fail with `service_unavailable`.
    pub failing_submits: AtomicU32,
    /// Back-end session status answered before submission.
    pub session_status: Mutex<HashMap<String, SessionStatus>>,
    /// VTXOs handed out by the next refill.
    pub refill: Mutex<Vec<Vtxo>>,
}

impl MockArk {
    pub fn submit_count(&self, session_id: &str) -> u32 {
        self.submit_calls
            .lock()
            .expect("lock")
            .get(session_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ArkService for MockArk {
    async fn create_vtxos(
        &self,
        asset_id: &str,
        amount: u64,
        count: u32,
    ) -> Result<Vec<Vtxo>, Error> {
        let mut scripted = self.refill.lock().expect("lock");
        if !scripted.is_empty() {
            return Ok(std::mem::take(&mut *scripted));
        }
        let now = now_unix();
        Ok((0..count)
            .map(|_| Vtxo {
                vtxo_id: format!("{}:0", Uuid::new_v4()),
                asset_id: asset_id.to_string(),
                amount,
                owner_pubkey: None,
                status: VtxoStatus::Available,
                reserved_by_session: None,
                created_at: now,
                expires_at: now + 86_400,
            })
            .collect())
    }

    async fn spend_vtxos(
        &self,
        vtxo_ids: &[String],
        _destination_pubkey: &str,
        _amount: u64,
        _asset_id: &str,
    ) -> Result<ArkTransaction, Error> {
        Ok(ArkTransaction {
            ark_tx: "deadbeef".to_string(),
            checkpoint_txs: vec![],
            fee_amount: 10 * vtxo_ids.len() as u64,
        })
    }

    async fn prepare_signing_request(
        &self,
        session_id: &str,
        _challenge_type: &str,
        context: &str,
    ) -> Result<PreparedSigningRequest, Error> {
        Ok(PreparedSigningRequest {
            payload_to_sign: format!("0x{session_id}"),
            human_readable_context: context.to_string(),
            expires_at: now_unix() + 300,
        })
    }

    async fn submit_signatures(
        &self,
        session_id: &str,
        _signatures: &[String],
    ) -> Result<SubmitOutcome, Error> {
        *self
            .submit_calls
            .lock()
            .expect("lock")
            .entry(session_id.to_string())
            .or_insert(0) += 1;

        let remaining = self.failing_submits.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_submits.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::new(
                ErrorKind::ServiceUnavailable,
                "arkd circuit is open",
            ));
        }

        Ok(SubmitOutcome {
            txid: format!("txid-{session_id}"),
            status: BackendSessionStatus::Committed,
        })
    }

    async fn get_session_status(&self, session_id: &str) -> Result<SessionStatus, Error> {
        Ok(self
            .session_status
            .lock()
            .expect("lock")
            .get(session_id)
            .cloned()
            .unwrap_or(SessionStatus {
                status: BackendSessionStatus::Unknown,
                txid: None,
            }))
    }
}

#[derive(Default)]
pub struct MockAsset {
    pub mint_calls: Mutex<Vec<(String, u64)>>,
    pub failing_mints: AtomicU32,
}

#[async_trait]
impl AssetService for MockAsset {
    async fn list_assets(&self) -> Result<Vec<AssetInfo>, Error> {
        Ok(vec![AssetInfo {
            asset_id: "gBTC".to_string(),
            name: "Gateway BTC".to_string(),
            ticker: "gBTC".to_string(),
            total_supply: 21_000_000,
        }])
    }

    async fn mint_asset(&self, asset_id: &str, amount: u64) -> Result<String, Error> {
        let remaining = self.failing_mints.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_mints.fetch_sub(1, Ordering::SeqCst);
            // Non-recoverable flavor so callers fail fast instead of
            // sitting out backoff sleeps in tests.
            return Err(Error::ad_hoc("tapd rejected the mint"));
        }
        self.mint_calls
            .lock()
            .expect("lock")
            .push((asset_id.to_string(), amount));
        Ok("mint-txid".to_string())
    }

    async fn transfer_asset(
        &self,
        _asset_id: &str,
        _amount: u64,
        _destination_pubkey: &str,
    ) -> Result<String, Error> {
        Ok("transfer-txid".to_string())
    }

    async fn create_asset_invoice(
        &self,
        _asset_id: &str,
        _amount: u64,
        _memo: &str,
    ) -> Result<AssetInvoice, Error> {
        Ok(AssetInvoice {
            invoice: "asset-invoice".to_string(),
            payment_hash: "00".repeat(32),
        })
    }

    async fn pay_asset_invoice(&self, _invoice: &str, _asset_id: &str) -> Result<String, Error> {
        Ok("pay-txid".to_string())
    }
}

pub struct MockLightning {
    /// Preimage used for the next created invoice; its hash becomes the
    /// payment hash.
    pub preimage: Mutex<[u8; 32]>,
    pub add_invoice_calls: AtomicU32,
    pub send_payment_calls: AtomicU32,
    pub payment_outcome: Mutex<Option<PaymentOutcome>>,
    pub lookups: Mutex<HashMap<String, InvoiceUpdate>>,
    /// Scripted answers for `lookup_payment`, keyed by payment hash.
    pub payment_lookups: Mutex<HashMap<String, PaymentOutcome>>,
}

impl Default for MockLightning {
    fn default() -> Self {
        Self {
            preimage: Mutex::new([7u8; 32]),
            add_invoice_calls: AtomicU32::new(0),
            send_payment_calls: AtomicU32::new(0),
            payment_outcome: Mutex::new(None),
            lookups: Mutex::new(HashMap::new()),
            payment_lookups: Mutex::new(HashMap::new()),
        }
    }
}

impl MockLightning {
    pub fn payment_hash(&self) -> String {
        let preimage = *self.preimage.lock().expect("lock");
        sha256::Hash::hash(&preimage).to_string()
    }

    pub fn settled_update(&self) -> InvoiceUpdate {
        let preimage = *self.preimage.lock().expect("lock");
        InvoiceUpdate {
            payment_hash: self.payment_hash(),
            bolt11: "lnbcrt1mock".to_string(),
            amount_sats: 10_000,
            state: InvoiceState::Settled,
            preimage: Some(hex::encode(preimage)),
            settled_at: Some(now_unix()),
            expires_at: now_unix() + 3600,
        }
    }
}

#[async_trait]
impl LightningService for MockLightning {
    async fn add_invoice(
        &self,
        _amount_sats: u64,
        _memo: &str,
        _expiry_seconds: i64,
    ) -> Result<CreatedInvoice, Error> {
        self.add_invoice_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedInvoice {
            payment_hash: self.payment_hash(),
            bolt11: "lnbcrt1mock".to_string(),
        })
    }

    async fn lookup_invoice(&self, payment_hash: &str) -> Result<Option<InvoiceUpdate>, Error> {
        Ok(self.lookups.lock().expect("lock").get(payment_hash).cloned())
    }

    async fn send_payment(
        &self,
        _bolt11: &str,
        amount_sats: u64,
        _timeout_seconds: i64,
    ) -> Result<PaymentOutcome, Error> {
        self.send_payment_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.payment_outcome.lock().expect("lock").clone();
        Ok(scripted.unwrap_or(PaymentOutcome {
            payment_hash: self.payment_hash(),
            preimage: Some(hex::encode(*self.preimage.lock().expect("lock"))),
            fee_sats: amount_sats / 1000,
            state: PaymentState::Complete,
            failure_reason: None,
        }))
    }

    async fn lookup_payment(&self, payment_hash: &str) -> Result<Option<PaymentOutcome>, Error> {
        Ok(self
            .payment_lookups
            .lock()
            .expect("lock")
            .get(payment_hash)
            .cloned())
    }

    async fn get_balance(&self) -> Result<NodeBalance, Error> {
        Ok(NodeBalance {
            confirmed_sats: 1_000_000,
            unconfirmed_sats: 0,
            local_channel_sats: 500_000,
            remote_channel_sats: 500_000,
        })
    }

    async fn subscribe_invoices(
        &self,
    ) -> Result<BoxStream<'static, Result<InvoiceUpdate, Error>>, Error> {
        Ok(futures::stream::empty().boxed())
    }
}

/// Captures outbound events instead of touching a relay network.
#[derive(Default)]
pub struct CapturingPublisher {
    /// `(kind, content, recipient)` in publication order.
    pub events: Mutex<Vec<(u16, String, String)>>,
}

impl CapturingPublisher {
    pub fn events_of_kind(&self, kind: u16) -> Vec<String> {
        self.events
            .lock()
            .expect("lock")
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, content, _)| content.clone())
            .collect()
    }

    pub fn kinds(&self) -> Vec<u16> {
        self.events
            .lock()
            .expect("lock")
            .iter()
            .map(|(k, _, _)| *k)
            .collect()
    }
}

#[async_trait]
impl OutboundPublisher for CapturingPublisher {
    async fn publish(
        &self,
        kind: u16,
        content: String,
        recipient: &str,
    ) -> Result<String, Error> {
        self.events
            .lock()
            .expect("lock")
            .push((kind, content, recipient.to_string()));
        Ok(Uuid::new_v4().to_string())
    }

    fn encrypt(&self, _recipient: &str, cleartext: &str) -> Result<String, Error> {
        Ok(cleartext.to_string())
    }

    fn decrypt(&self, _sender: &str, ciphertext: &str) -> Result<String, Error> {
        Ok(ciphertext.to_string())
    }
}

/// A wallet-side signer for driving ceremonies in tests.
pub struct TestWallet {
    keypair: Keypair,
    pub pubkey: String,
}

impl TestWallet {
    pub fn new() -> Self {
        let secp = Secp256k1::new();
        let keypair = Keypair::new(&secp, &mut thread_rng());
        let (pubkey, _) = keypair.x_only_public_key();
        Self {
            keypair,
            pubkey: pubkey.to_string(),
        }
    }

    /// BIP-340 signature over the challenge digest, hex.
    pub fn sign_payload_ref(&self, payload_ref: &str) -> String {
        let digest: [u8; 32] = hex::decode(payload_ref)
            .expect("payload ref is hex")
            .try_into()
            .expect("payload ref is 32 bytes");
        let secp = Secp256k1::new();
        secp.sign_schnorr(&Message::from_digest(digest), &self.keypair)
            .to_string()
    }
}

pub type TestOrchestrator = Orchestrator<MockArk, MockAsset, MockLightning, CapturingPublisher>;
pub type TestCoordinator = LightningCoordinator<MockAsset, MockLightning, CapturingPublisher>;

pub struct TestGateway {
    pub store: SessionStore,
    pub orchestrator: Arc<TestOrchestrator>,
    pub coordinator: Arc<TestCoordinator>,
    pub ark: Arc<MockArk>,
    pub asset: Arc<MockAsset>,
    pub lightning: Arc<MockLightning>,
    pub publisher: Arc<CapturingPublisher>,
    pub jobs: JobQueue,
    pub settings: Arc<Settings>,
    pub shutdown: CancellationToken,
}

pub async fn gateway() -> TestGateway {
    gateway_with(Settings::default()).await
}

pub async fn gateway_with(settings: Settings) -> TestGateway {
    let settings = Arc::new(settings);
    let store = SessionStore::new_in_memory().await.expect("store");

    let ark = Arc::new(MockArk::default());
    let asset = Arc::new(MockAsset::default());
    let lightning = Arc::new(MockLightning::default());
    let publisher = Arc::new(CapturingPublisher::default());

    let kv = Arc::new(InMemoryKv::new());
    let cache = Arc::new(ReadThroughCache::new(kv.clone(), settings.cache_ttl));
    let jobs = JobQueue::new(kv);
    let recovery = Arc::new(RecoveryTracker::default());
    let job_queue = jobs.clone();
    let shutdown = CancellationToken::new();

    let coordinator = Arc::new(LightningCoordinator::new(
        store.clone(),
        asset.clone(),
        lightning.clone(),
        publisher.clone(),
        cache.clone(),
        jobs,
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
        ark.clone(),
        inventory,
        coordinator.clone(),
        publisher.clone(),
        cache,
        settings.clone(),
        shutdown.clone(),
    ));

    TestGateway {
        store,
        orchestrator,
        coordinator,
        ark,
        asset,
        lightning,
        publisher,
        jobs: job_queue,
        settings,
        shutdown,
    }
}

pub fn pool_vtxo(id: &str, asset_id: &str, amount: u64, created_at: i64) -> Vtxo {
    Vtxo {
        vtxo_id: id.to_string(),
        asset_id: asset_id.to_string(),
        amount,
        owner_pubkey: None,
        status: VtxoStatus::Available,
        reserved_by_session: None,
        created_at,
        expires_at: now_unix() + 86_400,
    }
}

pub fn transfer_intent(action_id: &str, amount: u64, recipient: &str) -> String {
    serde_json::json!({
        "action_id": action_id,
        "type": "p2p_transfer",
        "params": {
            "asset_id": "gBTC",
            "amount": amount,
            "recipient_pubkey": recipient,
        },
        "expires_at": now_unix() + 600,
    })
    .to_string()
}

pub fn lift_intent(action_id: &str, amount: u64) -> String {
    serde_json::json!({
        "action_id": action_id,
        "type": "lightning_lift",
        "params": {
            "asset_id": "gBTC",
            "amount": amount,
        },
        "expires_at": now_unix() + 600,
    })
    .to_string()
}

pub fn land_intent(action_id: &str, amount: u64, invoice: &str) -> String {
    serde_json::json!({
        "action_id": action_id,
        "type": "lightning_land",
        "params": {
            "asset_id": "gBTC",
            "amount": amount,
            "lightning_invoice": invoice,
        },
        "expires_at": now_unix() + 600,
    })
    .to_string()
}

/// A real, signed BOLT-11 invoice for land-flow tests.
pub fn test_bolt11(amount_sats: u64, payment_hash_hex: &str) -> String {
    use lightning_invoice::Currency;
    use lightning_invoice::InvoiceBuilder;
    use lightning_invoice::PaymentSecret;

    let payment_hash: [u8; 32] = hex::decode(payment_hash_hex)
        .expect("payment hash is hex")
        .try_into()
        .expect("payment hash is 32 bytes");

    let secp = Secp256k1::new();
    let key = bitcoin::secp256k1::SecretKey::from_slice(&[41u8; 32]).expect("key");

    InvoiceBuilder::new(Currency::Regtest)
        .description("test payout".to_string())
        .payment_hash(sha256::Hash::from_byte_array(payment_hash))
        .payment_secret(PaymentSecret([42u8; 32]))
        .amount_milli_satoshis(amount_sats * 1000)
        .current_timestamp()
        .min_final_cltv_expiry_delta(144)
        .build_signed(|hash| secp.sign_ecdsa_recoverable(hash, &key))
        .expect("valid invoice")
        .to_string()
}

/// Drive a ceremony up to the wallet's signed response and return
/// `(session_id, challenge_id, signature)`.
pub async fn run_to_response(
    gateway: &TestGateway,
    wallet: &TestWallet,
    intent_json: &str,
) -> (String, String, String) {
    let session_id = gateway
        .orchestrator
        .handle_intent(&wallet.pubkey, intent_json)
        .await
        .expect("intent accepted");

    let challenges = gateway
        .publisher
        .events_of_kind(relay_core::events::KIND_CHALLENGE);
    let challenge: relay_core::events::ChallengeContent =
        serde_json::from_str(challenges.last().expect("challenge published"))
            .expect("challenge content");

    let signature = wallet.sign_payload_ref(&challenge.payload_ref);
    (session_id, challenge.challenge_id, signature)
}
