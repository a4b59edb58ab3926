use crate::canonical;
use crate::intent::Intent;
use crate::Error;
use crate::ErrorKind;
use bitcoin::key::Secp256k1;
use bitcoin::secp256k1::schnorr;
use bitcoin::secp256k1::Message;
use bitcoin::XOnlyPublicKey;
use serde::Deserialize;
use serde::Serialize;
use std::str::FromStr;

/// The deterministic bytes a wallet must sign to authorize an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengePayload {
    /// Canonical JSON of `{action_id, type, params}`.
    pub canonical: String,
    /// SHA-256 of the canonical text, lowercase hex.
    pub payload_ref: String,
    /// `"0x" + payload_ref`, the form displayed to and signed by wallets.
    pub payload_to_sign: String,
}

impl ChallengePayload {
    /// Derive the challenge payload for an intent. Same intent, same bytes.
    pub fn derive(intent: &Intent) -> Self {
        let canonical = intent.canonical_text();
        let payload_ref = canonical::payload_ref(&canonical);
        let payload_to_sign = canonical::payload_to_sign(&payload_ref);
        Self {
            canonical,
            payload_ref,
            payload_to_sign,
        }
    }
}

/// A stored signing challenge (see the session store for persistence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningChallenge {
    pub challenge_id: String,
    pub session_id: String,
    /// Canonical payload text the wallet signs over.
    pub payload: String,
    pub payload_ref: String,
    /// Human-readable rationale displayed by the wallet.
    pub context: String,
    pub expires_at: i64,
    pub is_used: bool,
    pub signature: Option<String>,
}

impl SigningChallenge {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}

/// Verify a wallet's BIP-340 signature over a challenge payload.
///
/// The signed message is the 32-byte SHA-256 digest referenced by
/// `payload_ref`; `signature` and `user_pubkey` are hex.
pub fn verify_challenge_signature(
    payload_ref: &str,
    signature: &str,
    user_pubkey: &str,
) -> Result<(), Error> {
    let digest = canonical::payload_digest(payload_ref)
        .map_err(|e| Error::invalid_signature(format!("bad challenge payload ref: {e}")))?;

    let signature = schnorr::Signature::from_str(signature)
        .map_err(|e| Error::invalid_signature(format!("malformed signature: {e}")))?;

    let pubkey = XOnlyPublicKey::from_str(user_pubkey)
        .map_err(|e| Error::invalid_signature(format!("malformed pubkey: {e}")))?;

    let secp = Secp256k1::verification_only();
    secp.verify_schnorr(&signature, &Message::from_digest(digest), &pubkey)
        .map_err(|_| {
            Error::new(
                ErrorKind::InvalidSignature,
                "signature does not verify against challenge payload",
            )
        })
}
