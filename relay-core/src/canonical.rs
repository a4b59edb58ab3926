use crate::Error;
use bitcoin::hashes::sha256;
use bitcoin::hashes::Hash;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Serialize a JSON value canonically: object keys sorted, no whitespace,
/// every string NFC-normalized.
///
/// Two wallets producing the same intent must arrive at byte-identical
/// canonical text, so the output must not depend on map iteration order or
/// on the Unicode representation the sender happened to use.
pub fn canonicalize_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                // Key presence was just checked.
                if let Some(v) = map.get(*key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    let normalized: String = s.nfc().collect();
    // serde_json escapes exactly the JSON-mandated characters.
    match serde_json::to_string(&normalized) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => {
            // A plain string cannot fail to serialize; keep the raw form as
            // a last resort rather than panicking in a signing path.
            out.push('"');
            out.push_str(&normalized);
            out.push('"');
        }
    }
}

/// SHA-256 digest of the canonical text, as lowercase hex.
pub fn payload_ref(canonical: &str) -> String {
    sha256::Hash::hash(canonical.as_bytes()).to_string()
}

/// The display form the wallet is asked to sign: `0x` + the payload ref.
pub fn payload_to_sign(payload_ref: &str) -> String {
    format!("0x{payload_ref}")
}

/// Decode a payload ref back into the 32-byte digest the wallet signed over.
pub fn payload_digest(payload_ref: &str) -> Result<[u8; 32], Error> {
    let bytes =
        hex::decode(payload_ref).map_err(|e| Error::ad_hoc(format!("invalid payload ref: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| Error::ad_hoc("payload ref is not a SHA-256 digest"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted() {
        let value = json!({"b": 1, "a": {"d": 2, "c": 3}});
        assert_eq!(canonicalize_json(&value), r#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn no_whitespace_is_emitted() {
        let value = json!({"k": [1, 2, {"x": "y z"}]});
        let canonical = canonicalize_json(&value);
        assert!(!canonical.contains(": "));
        assert!(!canonical.contains(", "));
    }

    #[test]
    fn strings_are_nfc_normalized() {
        // U+0065 U+0301 (e + combining acute) normalizes to U+00E9.
        let decomposed = json!({"name": "e\u{301}"});
        let composed = json!({"name": "\u{e9}"});
        assert_eq!(canonicalize_json(&decomposed), canonicalize_json(&composed));
    }

    #[test]
    fn payload_ref_is_stable() {
        let value = json!({"action_id": "A1", "type": "p2p_transfer"});
        let canonical = canonicalize_json(&value);
        assert_eq!(payload_ref(&canonical), payload_ref(&canonical));
        assert_eq!(payload_ref(&canonical).len(), 64);
        assert!(payload_to_sign(&payload_ref(&canonical)).starts_with("0x"));
    }

    #[test]
    fn digest_round_trips() {
        let value = json!({"a": 1});
        let r = payload_ref(&canonicalize_json(&value));
        let digest = payload_digest(&r).unwrap();
        assert_eq!(hex::encode(digest), r);
    }
}
