use crate::Error;
use bitcoin::hashes::sha256;
use bitcoin::hashes::Hash;
use bitcoin::key::Secp256k1;
use bitcoin::secp256k1::schnorr;
use bitcoin::secp256k1::Message;
use bitcoin::XOnlyPublicKey;
use serde::Deserialize;
use serde::Serialize;
use std::str::FromStr;

/// A decoded relay event in wire shape.
///
/// Kept independent of the relay library so signature verification can be
/// done from first principles: the id is recomputed from the canonical
/// serialization and the BIP-340 signature checked against the author key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

impl GatewayEvent {
    /// Recompute the event id: `sha256` of the canonical serialization
    /// `[0, pubkey, created_at, kind, tags, content]`.
    pub fn compute_id(&self) -> String {
        let serialized = serde_json::json!([
            0,
            self.pubkey,
            self.created_at,
            self.kind,
            self.tags,
            self.content,
        ]);
        // Compact form, no whitespace.
        let serialized = serialized.to_string();
        sha256::Hash::hash(serialized.as_bytes()).to_string()
    }

    /// Verify the event from first principles: the id must match the
    /// canonical serialization and the signature must verify against the
    /// author's key over that id.
    pub fn verify(&self) -> Result<(), Error> {
        let expected_id = self.compute_id();
        if expected_id != self.id {
            return Err(Error::verify(format!(
                "event id mismatch: expected {expected_id}, got {}",
                self.id
            )));
        }

        let digest: [u8; 32] = hex::decode(&self.id)
            .map_err(|e| Error::verify(format!("event id is not hex: {e}")))?
            .try_into()
            .map_err(|_| Error::verify("event id is not a SHA-256 digest"))?;

        let signature = schnorr::Signature::from_str(&self.sig)
            .map_err(|e| Error::verify(format!("malformed signature: {e}")))?;
        let pubkey = XOnlyPublicKey::from_str(&self.pubkey)
            .map_err(|e| Error::verify(format!("malformed pubkey: {e}")))?;

        let secp = Secp256k1::verification_only();
        secp.verify_schnorr(&signature, &Message::from_digest(digest), &pubkey)
            .map_err(|e| Error::verify(format!("schnorr verification failed: {e}")))
    }

    /// First `p` tag value, the conventional recipient marker.
    pub fn first_p_tag(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.first().map(String::as_str) == Some("p"))
            .and_then(|tag| tag.get(1))
            .map(String::as_str)
    }
}
