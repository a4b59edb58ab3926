//! Challenge generation and one-shot verification against the store.

use crate::store::SessionStore;
use relay_core::challenge::verify_challenge_signature;
use relay_core::ChallengePayload;
use relay_core::Error;
use relay_core::ErrorKind;
use relay_core::Intent;
use relay_core::SigningChallenge;
use uuid::Uuid;

/// Build the challenge record for an intent. The payload derivation is
/// deterministic; the id is fresh per session.
pub fn generate_challenge(
    intent: &Intent,
    session_id: &str,
    context: &str,
    now: i64,
    ttl_seconds: i64,
    session_expires_at: i64,
) -> SigningChallenge {
    let payload = ChallengePayload::derive(intent);

    SigningChallenge {
        challenge_id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        payload: payload.canonical,
        payload_ref: payload.payload_ref,
        context: context.to_string(),
        // A challenge never outlives its session.
        expires_at: (now + ttl_seconds).min(session_expires_at),
        is_used: false,
        signature: None,
    }
}

/// One-shot verification of a wallet's signed response.
///
/// Order matters: the expiry and replay checks answer with their specific
/// error before any cryptography runs, and the atomic mark-used decides the
/// winner when two responses race. A challenge presented exactly at
/// its deadline is rejected.
pub async fn verify_signing_response(
    store: &SessionStore,
    challenge_id: &str,
    signature: &str,
    user_pubkey: &str,
    now: i64,
) -> Result<SigningChallenge, Error> {
    let challenge = store
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| {
            Error::new(
                ErrorKind::ChallengeNotFound,
                format!("challenge {challenge_id} not found"),
            )
        })?;

    if now >= challenge.expires_at {
        return Err(Error::new(
            ErrorKind::ChallengeExpired,
            format!("challenge {challenge_id} expired at {}", challenge.expires_at),
        ));
    }

    if challenge.is_used {
        return Err(Error::new(
            ErrorKind::ChallengeAlreadyUsed,
            format!("challenge {challenge_id} already used"),
        ));
    }

    verify_challenge_signature(&challenge.payload_ref, signature, user_pubkey)?;

    let (won, updated) = store
        .mark_challenge_used(challenge_id, signature, now)
        .await?;
    if !won {
        return Err(Error::new(
            ErrorKind::ChallengeAlreadyUsed,
            format!("challenge {challenge_id} already used"),
        ));
    }

    updated.ok_or_else(|| Error::ad_hoc("challenge vanished after mark-used"))
}
