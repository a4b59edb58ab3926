// Allow common test patterns that clippy warns about
#![allow(clippy::unwrap_used)]

mod common;

use common::gateway;
use common::gateway_with;
use common::land_intent;
use common::lift_intent;
use common::pool_vtxo;
use common::run_to_response;
use common::test_bolt11;
use common::transfer_intent;
use common::TestWallet;
use relay_core::events;
use relay_core::now_unix;
use relay_core::ErrorKind;
use relay_core::InvoiceStatus;
use relay_core::SessionState;
use relay_gateway::JobKind;
use relay_gateway::Settings;
use relay_grpc::PaymentOutcome;
use relay_grpc::PaymentState;
use std::sync::atomic::Ordering;

const RECIPIENT: &str = "bcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbcbc";

#[tokio::test]
async fn transfer_completes_end_to_end() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    gw.store
        .insert_vtxos(&[
            pool_vtxo("a:0", "gBTC", 6_000, 1),
            pool_vtxo("b:0", "gBTC", 4_000, 2),
        ])
        .await
        .unwrap();

    let intent = transfer_intent("A1", 10_000, RECIPIENT);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Completed);

    // Sender debited, recipient credited, reservation fully unwound.
    let sender = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(sender.balance, 40_000);
    assert_eq!(sender.reserved, 0);
    let recipient = gw.store.get_balance(RECIPIENT, "gBTC").await.unwrap();
    assert_eq!(recipient.balance, 10_000);

    // Outbound ordering: challenge, then statuses, then the terminal event.
    let kinds = gw.publisher.kinds();
    assert_eq!(kinds.first(), Some(&events::KIND_CHALLENGE));
    assert_eq!(kinds.last(), Some(&events::KIND_SUCCESS));

    let success: events::SuccessContent =
        serde_json::from_str(&gw.publisher.events_of_kind(events::KIND_SUCCESS)[0]).unwrap();
    assert_eq!(success.ref_action_id, "A1");
    assert_eq!(success.results.amount, 10_000);
    assert!(success.results.txid.is_some());
}

#[tokio::test]
async fn lift_completes_after_settlement() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    let intent = lift_intent("L1", 10_000);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    // Invoice created and parked in committing until the feed settles it.
    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Committing);
    assert_eq!(gw.lightning.add_invoice_calls.load(Ordering::SeqCst), 1);

    let invoice = gw
        .store
        .get_invoice(&gw.lightning.payment_hash())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.session_id.as_deref(), Some(session_id.as_str()));

    // The monitor reports SETTLED with the right preimage.
    gw.coordinator
        .settle_lift(&gw.lightning.settled_update())
        .await
        .unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Completed);

    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.balance, 10_000);
    assert_eq!(gw.asset.mint_calls.lock().unwrap().as_slice(), [(
        "gBTC".to_string(),
        10_000
    )]);

    // Settlement re-delivery is a no-op.
    gw.coordinator
        .settle_lift(&gw.lightning.settled_update())
        .await
        .unwrap();
    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.balance, 10_000);
}

#[tokio::test]
async fn lift_mint_failure_is_retried_from_the_job_queue() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    // The first mint attempt fails.
    gw.asset.failing_mints.store(1, Ordering::SeqCst);

    let intent = lift_intent("L2", 10_000);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;
    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    let payment_hash = gw.lightning.payment_hash();
    gw.coordinator
        .settle_lift(&gw.lightning.settled_update())
        .await
        .unwrap_err();

    // The invoice is paid but the credit is still owed; the session stays
    // live and a retry job is queued.
    let invoice = gw.store.get_invoice(&payment_hash).await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Committing);

    let job = gw.jobs.dequeue().await.unwrap().unwrap();
    assert_eq!(job.kind, JobKind::RetrySettlement);
    assert_eq!(job.target, payment_hash);

    // The retry path re-reads the node's view of the invoice.
    gw.lightning
        .lookups
        .lock()
        .unwrap()
        .insert(payment_hash.clone(), gw.lightning.settled_update());

    gw.coordinator.retry_settlement(&job.target).await.unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Completed);
    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.balance, 10_000);
    assert_eq!(
        gw.asset.mint_calls.lock().unwrap().as_slice(),
        [("gBTC".to_string(), 10_000)]
    );
}

#[tokio::test]
async fn land_with_insufficient_balance_fails_before_lightning() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 1_000, 0)
        .await
        .unwrap();

    let intent = land_intent("D1", 10_000, "lnbc1invalid");
    let session_id = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &intent)
        .await
        .unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Failed);

    // No reservation was made and the Lightning node was never called.
    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.reserved, 0);
    assert_eq!(gw.lightning.send_payment_calls.load(Ordering::SeqCst), 0);

    let failure: events::FailureContent =
        serde_json::from_str(&gw.publisher.events_of_kind(events::KIND_FAILURE)[0]).unwrap();
    assert_eq!(failure.code, ErrorKind::InsufficientBalance);
    assert_eq!(failure.ref_action_id, "D1");
}

#[tokio::test]
async fn land_completes_and_debits_amount_plus_fee() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    gw.store
        .insert_vtxos(&[
            pool_vtxo("a:0", "gBTC", 6_000, 1),
            pool_vtxo("b:0", "gBTC", 4_000, 2),
        ])
        .await
        .unwrap();

    let bolt11 = test_bolt11(10_000, &gw.lightning.payment_hash());
    let intent = land_intent("D2", 10_000, &bolt11);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Completed);
    assert_eq!(gw.lightning.send_payment_calls.load(Ordering::SeqCst), 1);

    // Amount plus the estimated fee (0.1% of 10k = 10 sats) left the
    // balance; the reservation is unwound.
    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.balance, 50_000 - 10_010);
    assert_eq!(balance.reserved, 0);
}

#[tokio::test]
async fn inflight_land_payment_parks_then_commits_via_poll() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    gw.store
        .insert_vtxos(&[
            pool_vtxo("a:0", "gBTC", 6_000, 1),
            pool_vtxo("b:0", "gBTC", 4_000, 2),
        ])
        .await
        .unwrap();

    let payment_hash = gw.lightning.payment_hash();
    // The node keeps trying past the payment deadline.
    *gw.lightning.payment_outcome.lock().unwrap() = Some(PaymentOutcome {
        payment_hash: payment_hash.clone(),
        preimage: None,
        fee_sats: 0,
        state: PaymentState::InFlight,
        failure_reason: None,
    });

    let bolt11 = test_bolt11(10_000, &payment_hash);
    let intent = land_intent("IF1", 10_000, &bolt11);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    // Not abandoned: the session parks in committing with its reservation
    // held, and a poll job is queued for the unresolved payment.
    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Committing);
    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.reserved, 10_000);
    let invoice = gw.store.get_invoice(&payment_hash).await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::PendingPayment);

    let job = gw.jobs.dequeue().await.unwrap().unwrap();
    assert_eq!(job.kind, JobKind::PollInvoice);
    assert_eq!(job.target, payment_hash);

    // First poll: still in flight, so the job goes back on the queue and
    // nothing moves.
    gw.lightning.payment_lookups.lock().unwrap().insert(
        payment_hash.clone(),
        PaymentOutcome {
            payment_hash: payment_hash.clone(),
            preimage: None,
            fee_sats: 0,
            state: PaymentState::InFlight,
            failure_reason: None,
        },
    );
    gw.coordinator.retry_settlement(&job.target).await.unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Committing);
    let job = gw.jobs.dequeue().await.unwrap().unwrap();
    assert_eq!(job.kind, JobKind::PollInvoice);

    // Second poll: the payment completed; the debit lands exactly once.
    gw.lightning.payment_lookups.lock().unwrap().insert(
        payment_hash.clone(),
        PaymentOutcome {
            payment_hash: payment_hash.clone(),
            preimage: Some("ab".repeat(32)),
            fee_sats: 7,
            state: PaymentState::Complete,
            failure_reason: None,
        },
    );
    gw.coordinator.retry_settlement(&job.target).await.unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Completed);
    let invoice = gw.store.get_invoice(&payment_hash).await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);

    // Amount plus the estimated fee left the balance, reservation unwound.
    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.balance, 50_000 - 10_010);
    assert_eq!(balance.reserved, 0);

    let success: events::SuccessContent =
        serde_json::from_str(&gw.publisher.events_of_kind(events::KIND_SUCCESS)[0]).unwrap();
    assert_eq!(success.ref_action_id, "IF1");
    assert_eq!(success.results.payment_hash.as_deref(), Some(payment_hash.as_str()));
    assert_eq!(success.results.fee, 7);

    // Re-delivering the poll job is a no-op on the settled invoice.
    gw.coordinator.retry_settlement(&payment_hash).await.unwrap();
    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.balance, 50_000 - 10_010);
}

#[tokio::test]
async fn inflight_land_payment_fails_cleanly_when_node_reports_failure() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    gw.store
        .insert_vtxos(&[pool_vtxo("a:0", "gBTC", 10_000, 1)])
        .await
        .unwrap();

    let payment_hash = gw.lightning.payment_hash();
    *gw.lightning.payment_outcome.lock().unwrap() = Some(PaymentOutcome {
        payment_hash: payment_hash.clone(),
        preimage: None,
        fee_sats: 0,
        state: PaymentState::InFlight,
        failure_reason: None,
    });

    let bolt11 = test_bolt11(10_000, &payment_hash);
    let intent = land_intent("IF2", 10_000, &bolt11);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    let job = gw.jobs.dequeue().await.unwrap().unwrap();
    assert_eq!(job.kind, JobKind::PollInvoice);

    gw.lightning.payment_lookups.lock().unwrap().insert(
        payment_hash.clone(),
        PaymentOutcome {
            payment_hash: payment_hash.clone(),
            preimage: None,
            fee_sats: 0,
            state: PaymentState::Failed,
            failure_reason: Some("no route".to_string()),
        },
    );
    gw.coordinator.retry_settlement(&job.target).await.unwrap();

    // Clean failure: session failed, invoice failed, reservation released.
    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Failed);
    let invoice = gw.store.get_invoice(&payment_hash).await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Failed);

    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.balance, 50_000);
    assert_eq!(balance.reserved, 0);
    assert_eq!(
        gw.store
            .list_available_vtxos("gBTC", now_unix())
            .await
            .unwrap()
            .len(),
        1
    );

    let failure: events::FailureContent =
        serde_json::from_str(&gw.publisher.events_of_kind(events::KIND_FAILURE)[0]).unwrap();
    assert_eq!(failure.code, ErrorKind::PaymentFailed);
    assert_eq!(failure.message, "no route");
    assert_eq!(failure.ref_action_id, "IF2");
}

#[tokio::test]
async fn duplicate_response_is_rejected_with_already_used() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    gw.store
        .insert_vtxos(&[pool_vtxo("a:0", "gBTC", 10_000, 1)])
        .await
        .unwrap();

    let intent = transfer_intent("R1", 10_000, RECIPIENT);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    let err = gw
        .orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChallengeAlreadyUsed);

    // The session reflects only the first response.
    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Completed);
    assert_eq!(gw.ark.submit_count(&session_id), 1);
}

#[tokio::test]
async fn backend_unavailable_fails_session_and_releases_reservations() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    gw.store
        .insert_vtxos(&[pool_vtxo("a:0", "gBTC", 10_000, 1)])
        .await
        .unwrap();
    gw.ark.failing_submits.store(1, Ordering::SeqCst);

    let intent = transfer_intent("C1", 10_000, RECIPIENT);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    let err = gw
        .orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Failed);

    // Compensation: the reservation is gone and the inventory is reusable.
    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.balance, 50_000);
    assert_eq!(balance.reserved, 0);
    let available = gw
        .store
        .list_available_vtxos("gBTC", now_unix())
        .await
        .unwrap();
    assert_eq!(available.len(), 1);

    let failure: events::FailureContent =
        serde_json::from_str(&gw.publisher.events_of_kind(events::KIND_FAILURE)[0]).unwrap();
    assert_eq!(failure.code, ErrorKind::ServiceUnavailable);
}

#[tokio::test]
async fn committed_backend_session_is_not_resubmitted() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    gw.store
        .insert_vtxos(&[pool_vtxo("a:0", "gBTC", 10_000, 1)])
        .await
        .unwrap();

    let intent = transfer_intent("IDEM1", 10_000, RECIPIENT);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    // The back end already committed this session in a previous ambiguous
    // attempt; submitting again would debit twice.
    gw.ark.session_status.lock().unwrap().insert(
        session_id.clone(),
        relay_grpc::SessionStatus {
            status: relay_grpc::BackendSessionStatus::Committed,
            txid: Some("txid-earlier".to_string()),
        },
    );

    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    assert_eq!(gw.ark.submit_count(&session_id), 0);

    let success: events::SuccessContent =
        serde_json::from_str(&gw.publisher.events_of_kind(events::KIND_SUCCESS)[0]).unwrap();
    assert_eq!(success.results.txid.as_deref(), Some("txid-earlier"));
}

#[tokio::test]
async fn expired_intent_creates_no_session() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    let intent = serde_json::json!({
        "action_id": "E1",
        "type": "p2p_transfer",
        "params": {
            "asset_id": "gBTC",
            "amount": 10_000,
            "recipient_pubkey": RECIPIENT,
        },
        "expires_at": now_unix() - 1,
    })
    .to_string();

    let err = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &intent)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExpiredIntent);

    assert!(gw
        .store
        .get_session_by_action_id("E1")
        .await
        .unwrap()
        .is_none());
    assert_eq!(gw.store.count_active_sessions().await.unwrap(), 0);

    let failure: events::FailureContent =
        serde_json::from_str(&gw.publisher.events_of_kind(events::KIND_FAILURE)[0]).unwrap();
    assert_eq!(failure.code, ErrorKind::ExpiredIntent);
}

#[tokio::test]
async fn replayed_intent_returns_existing_session() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();

    let intent = transfer_intent("RPL1", 10_000, RECIPIENT);
    let first = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &intent)
        .await
        .unwrap();
    let second = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &intent)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(gw.store.count_active_sessions().await.unwrap(), 1);
    // Only the first delivery published a challenge.
    assert_eq!(
        gw.publisher.events_of_kind(events::KIND_CHALLENGE).len(),
        1
    );
}

#[tokio::test]
async fn admission_control_rejects_over_capacity() {
    let mut settings = Settings::default();
    settings.max_concurrent_sessions = 1;
    let gw = gateway_with(settings).await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();

    gw.orchestrator
        .handle_intent(&wallet.pubkey, &transfer_intent("F1", 1_000, RECIPIENT))
        .await
        .unwrap();

    let err = gw
        .orchestrator
        .handle_intent(&wallet.pubkey, &transfer_intent("F2", 1_000, RECIPIENT))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
}

#[tokio::test]
async fn foreign_key_response_does_not_fail_the_session() {
    let gw = gateway().await;
    let wallet = TestWallet::new();
    let stranger = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();

    let intent = transfer_intent("S1", 10_000, RECIPIENT);
    let (session_id, challenge_id, _) = run_to_response(&gw, &wallet, &intent).await;

    let forged = stranger.sign_payload_ref(&gw.store
        .get_challenge(&challenge_id)
        .await
        .unwrap()
        .unwrap()
        .payload_ref);

    let err = gw
        .orchestrator
        .handle_signing_response(&stranger.pubkey, &challenge_id, &forged)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);

    // The owner's session is still waiting for the real response.
    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::ChallengeSent);
}

#[tokio::test]
async fn invalid_signature_fails_the_session() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();

    let intent = transfer_intent("B1", 10_000, RECIPIENT);
    let (session_id, challenge_id, _) = run_to_response(&gw, &wallet, &intent).await;

    // A signature over the wrong payload.
    let bogus = wallet.sign_payload_ref(&"11".repeat(32));

    let err = gw
        .orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &bogus)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Failed);
}

#[tokio::test]
async fn concurrent_responses_yield_one_winner() {
    // Two verifications of the same challenge: one success and one
    // challenge_already_used, regardless of interleaving.
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();

    let intent = transfer_intent("W1", 10_000, RECIPIENT);
    let (_, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    let now = now_unix();
    let a = relay_gateway::challenge::verify_signing_response(
        &gw.store,
        &challenge_id,
        &signature,
        &wallet.pubkey,
        now,
    );
    let b = relay_gateway::challenge::verify_signing_response(
        &gw.store,
        &challenge_id,
        &signature,
        &wallet.pubkey,
        now,
    );
    let (a, b) = tokio::join!(a, b);

    let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(oks, 1);
    let err = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert_eq!(err.kind(), ErrorKind::ChallengeAlreadyUsed);
}

#[tokio::test]
async fn transfer_of_full_balance_reserves_everything() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 10_000, 0)
        .await
        .unwrap();
    gw.store
        .insert_vtxos(&[
            pool_vtxo("a:0", "gBTC", 4_000, 1),
            pool_vtxo("b:0", "gBTC", 6_000, 2),
        ])
        .await
        .unwrap();

    let inventory = relay_gateway::Inventory::new(
        gw.store.clone(),
        gw.ark.clone(),
        gw.settings.vtxo_min_amount,
    );
    inventory
        .reserve(&wallet.pubkey, "gBTC", 10_000, "session-full")
        .await
        .unwrap();

    let balance = gw.store.get_balance(&wallet.pubkey, "gBTC").await.unwrap();
    assert_eq!(balance.reserved, balance.balance);
}

#[tokio::test]
async fn empty_inventory_refills_from_arkd() {
    let gw = gateway().await;
    let wallet = TestWallet::new();

    gw.store
        .adjust_balance(&wallet.pubkey, "gBTC", 50_000, 0)
        .await
        .unwrap();
    // Nothing seeded: the mock refill provides fresh outputs on demand.

    let intent = transfer_intent("RF1", 10_000, RECIPIENT);
    let (session_id, challenge_id, signature) = run_to_response(&gw, &wallet, &intent).await;

    gw.orchestrator
        .handle_signing_response(&wallet.pubkey, &challenge_id, &signature)
        .await
        .unwrap();

    let session = gw.store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Completed);
}
