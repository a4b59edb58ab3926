// Allow common test patterns that clippy warns about
#![allow(clippy::unwrap_used)]

mod common;

use common::gateway_with;
use common::pool_vtxo;
use common::transfer_intent;
use common::TestWallet;
use relay_core::events;
use relay_core::now_unix;
use relay_core::ErrorKind;
use relay_core::InvoiceStatus;
use relay_core::InvoiceType;
use relay_core::LightningInvoice;
use relay_core::SessionState;
use relay_core::VtxoStatus;
use relay_gateway::challenge::verify_signing_response;
use relay_gateway::JobQueue;
use relay_gateway::InMemoryKv;
use relay_gateway::ReadThroughCache;
use relay_gateway::SessionStore;
use relay_gateway::Settings;
use relay_gateway::Sweeper;
use std::sync::Arc;
use std::time::Duration;

const RECIPIENT: &str = "bcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbc";

#[tokio::test]
async fn conditional_update_rejects_wrong_source_state() {
    let gw = gateway_with(Settings::default()).await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    let session_id = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &transfer_intent("CU1", 1_000, RECIPIENT))
        .await
        .unwrap();

    // Session is in challenge_sent; a transition claiming another source
    // state loses.
    let moved = gw
        .store
        .update_session_state(&session_id, SessionState::Signing, SessionState::Committing)
        .await
        .unwrap();
    assert!(!moved);

    let moved = gw
        .store
        .update_session_state(
            &session_id,
            SessionState::ChallengeSent,
            SessionState::AwaitingSignature,
        )
        .await
        .unwrap();
    assert!(moved);
}

#[tokio::test]
async fn terminal_sessions_never_transition_again() {
    let gw = gateway_with(Settings::default()).await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    let session_id = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &transfer_intent("T1", 1_000, RECIPIENT))
        .await
        .unwrap();

    assert!(gw
        .store
        .fail_session(&session_id, ErrorKind::Internal, "first failure")
        .await
        .unwrap());

    // A second failure, an expiry and a state update all bounce off.
    assert!(!gw
        .store
        .fail_session(&session_id, ErrorKind::Internal, "second failure")
        .await
        .unwrap());
    assert!(!gw.store.expire_session(&session_id).await.unwrap());
    assert!(!gw
        .store
        .update_session_state(&session_id, SessionState::Failed, SessionState::Initiated)
        .await
        .unwrap());
}

#[tokio::test]
async fn balance_check_constraint_holds() {
    let store = SessionStore::new_in_memory().await.unwrap();

    store.adjust_balance("alice", "gBTC", 1_000, 0).await.unwrap();

    // Reserving more than the balance violates the schema constraint.
    let err = store
        .adjust_balance("alice", "gBTC", 0, 2_000)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreConflict);

    // Going negative is equally rejected.
    let err = store
        .adjust_balance("alice", "gBTC", -5_000, 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreConflict);

    let balance = store.get_balance("alice", "gBTC").await.unwrap();
    assert_eq!(balance.balance, 1_000);
    assert_eq!(balance.reserved, 0);
}

#[tokio::test]
async fn reservation_keeps_balance_and_vtxos_in_step() {
    let store = SessionStore::new_in_memory().await.unwrap();

    store.adjust_balance("alice", "gBTC", 20_000, 0).await.unwrap();
    store
        .insert_vtxos(&[
            pool_vtxo("a:0", "gBTC", 5_000, 1),
            pool_vtxo("b:0", "gBTC", 7_000, 2),
        ])
        .await
        .unwrap();

    let reserved = store
        .reserve_vtxos("alice", "gBTC", 10_000, "s1")
        .await
        .unwrap();
    let reserved_total: u64 = reserved.iter().map(|v| v.amount).sum();
    assert_eq!(reserved_total, 12_000);

    // The reserved VTXO sum matches the reserved balance exactly.
    let balance = store.get_balance("alice", "gBTC").await.unwrap();
    assert_eq!(balance.reserved, reserved_total);

    let held = store.list_vtxos_for_session("s1").await.unwrap();
    assert_eq!(held.len(), 2);
    assert!(held.iter().all(|v| v.status == VtxoStatus::Reserved));

    // Releasing restores both sides.
    let released = store.release_reservation("s1").await.unwrap();
    assert_eq!(released, reserved_total);

    let balance = store.get_balance("alice", "gBTC").await.unwrap();
    assert_eq!(balance.reserved, 0);
    assert_eq!(
        store
            .list_available_vtxos("gBTC", now_unix())
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn reservation_without_session_row_cannot_release_balance_twice() {
    let store = SessionStore::new_in_memory().await.unwrap();
    // Releasing a session with no reservation is a no-op.
    assert_eq!(store.release_reservation("ghost").await.unwrap(), 0);
}

#[tokio::test]
async fn reserve_more_than_balance_is_rejected_atomically() {
    let store = SessionStore::new_in_memory().await.unwrap();

    store.adjust_balance("alice", "gBTC", 5_000, 0).await.unwrap();
    store
        .insert_vtxos(&[pool_vtxo("a:0", "gBTC", 9_000, 1)])
        .await
        .unwrap();

    let err = store
        .reserve_vtxos("alice", "gBTC", 6_000, "s1")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);

    // The failed reservation left no trace on either side.
    let balance = store.get_balance("alice", "gBTC").await.unwrap();
    assert_eq!(balance.reserved, 0);
    assert_eq!(
        store
            .list_available_vtxos("gBTC", now_unix())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn challenge_mark_used_is_one_shot() {
    let gw = gateway_with(Settings::default()).await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    let session_id = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &transfer_intent("CAS1", 1_000, RECIPIENT))
        .await
        .unwrap();
    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    let challenge_id = session.challenge_id.unwrap();

    let now = now_unix();
    let (won, challenge) = gw
        .store
        .mark_challenge_used(&challenge_id, "sig-one", now)
        .await
        .unwrap();
    assert!(won);
    assert_eq!(challenge.unwrap().signature.as_deref(), Some("sig-one"));

    let (won, challenge) = gw
        .store
        .mark_challenge_used(&challenge_id, "sig-two", now)
        .await
        .unwrap();
    assert!(!won);
    // The recorded signature is the winner's.
    assert_eq!(challenge.unwrap().signature.as_deref(), Some("sig-one"));
}

#[tokio::test]
async fn challenge_at_exact_expiry_is_rejected() {
    let mut settings = Settings::default();
    settings.challenge_timeout = Duration::from_secs(0);
    let gw = gateway_with(settings).await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    let session_id = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &transfer_intent("EX1", 1_000, RECIPIENT))
        .await
        .unwrap();
    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    let challenge_id = session.challenge_id.unwrap();
    let challenge = gw.store.get_challenge(&challenge_id).await.unwrap().unwrap();

    let signature = wallet.sign_payload_ref(&challenge.payload_ref);

    // now == expires_at: the boundary rejects.
    let err = verify_signing_response(
        &gw.store,
        &challenge_id,
        &signature,
        &wallet.pubkey,
        challenge.expires_at,
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChallengeExpired);
}

#[tokio::test]
async fn sweeper_expires_overdue_sessions_and_invoices() {
    let mut settings = Settings::default();
    settings.session_timeout = Duration::from_secs(0);
    let gw = gateway_with(settings).await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    let session_id = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &transfer_intent("SW1", 1_000, RECIPIENT))
        .await
        .unwrap();

    let now = now_unix();
    gw.store
        .create_invoice(&LightningInvoice {
            payment_hash: "aa".repeat(32),
            bolt11: "lnbcrt1old".to_string(),
            session_id: None,
            amount_sats: 1_000,
            asset_id: "gBTC".to_string(),
            status: InvoiceStatus::Pending,
            invoice_type: InvoiceType::Lift,
            created_at: now - 100,
            expires_at: now - 10,
            paid_at: None,
        })
        .await
        .unwrap();

    // Session TTL of zero means the deadline passed the moment it was made.
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let kv = Arc::new(InMemoryKv::new());
    let sweeper = Sweeper::new(
        gw.store.clone(),
        gw.publisher.clone(),
        Arc::new(ReadThroughCache::new(kv.clone(), Duration::from_secs(60))),
        JobQueue::new(kv),
        Duration::from_secs(30),
    );
    sweeper.sweep_once().await.unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Expired);

    let invoice = gw.store.get_invoice(&"aa".repeat(32)).await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Expired);

    // The expired session announced itself as a failure with the expiry
    // code.
    let failures = gw.publisher.events_of_kind(events::KIND_FAILURE);
    let failure: events::FailureContent = serde_json::from_str(&failures[0]).unwrap();
    assert_eq!(failure.code, ErrorKind::ExpiredIntent);
    assert_eq!(failure.ref_action_id, "SW1");
}

#[tokio::test]
async fn store_opens_and_migrates_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("nested").join("gateway.db"))
        .await
        .unwrap();
    store.adjust_balance("alice", "gBTC", 1_000, 0).await.unwrap();
    assert_eq!(
        store.get_balance("alice", "gBTC").await.unwrap().balance,
        1_000
    );
}

#[tokio::test]
async fn expired_vtxos_leave_the_selection_pool() {
    let store = SessionStore::new_in_memory().await.unwrap();
    let now = now_unix();

    let mut stale = pool_vtxo("old:0", "gBTC", 5_000, now - 1000);
    stale.expires_at = now - 1;
    store
        .insert_vtxos(&[stale, pool_vtxo("fresh:0", "gBTC", 5_000, now)])
        .await
        .unwrap();

    assert_eq!(store.expire_available_vtxos(now).await.unwrap(), 1);

    let available = store.list_available_vtxos("gBTC", now).await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].vtxo_id, "fresh:0");
}

#[tokio::test]
async fn invoice_status_updates_guard_terminal_states() {
    let store = SessionStore::new_in_memory().await.unwrap();
    let now = now_unix();

    store
        .create_invoice(&LightningInvoice {
            payment_hash: "cc".repeat(32),
            bolt11: "lnbcrt1x".to_string(),
            session_id: None,
            amount_sats: 500,
            asset_id: "gBTC".to_string(),
            status: InvoiceStatus::Pending,
            invoice_type: InvoiceType::Lift,
            created_at: now,
            expires_at: now + 3600,
            paid_at: None,
        })
        .await
        .unwrap();

    assert!(store
        .update_invoice_status(&"cc".repeat(32), InvoiceStatus::Paid, Some(now))
        .await
        .unwrap());

    // Paid is terminal; a late expiry sweep cannot demote it.
    assert!(!store
        .update_invoice_status(&"cc".repeat(32), InvoiceStatus::Expired, None)
        .await
        .unwrap());

    let invoice = store.get_invoice(&"cc".repeat(32)).await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(invoice.paid_at, Some(now));
}
