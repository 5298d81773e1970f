//! Unsafe JWT payload peek
//!
//! The service encodes the acting user id in the token's `sub` claim.
//! This decode is UNVERIFIED - no signature check - and must only ever
//! steer client-side defaults, never authorization.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

use openibuy_types::positive_id;

/// Decode the numeric `sub` claim of a JWT without verifying it.
///
/// Returns `None` for anything that is not a well-formed token with a
/// finite, positive numeric subject.
pub fn decode_sub_unsafe(token: &str) -> Option<u64> {
    let payload_b64 = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let payload: Value = serde_json::from_slice(&bytes).ok()?;
    positive_id(payload.get("sub")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with_payload(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"none\"}");
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.sig")
    }

    #[test]
    fn test_decodes_numeric_sub() {
        let token = token_with_payload(&json!({"sub": 4217}));
        assert_eq!(decode_sub_unsafe(&token), Some(4217));
    }

    #[test]
    fn test_decodes_string_sub() {
        let token = token_with_payload(&json!({"sub": "99"}));
        assert_eq!(decode_sub_unsafe(&token), Some(99));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(decode_sub_unsafe("not-a-jwt"), None);
        assert_eq!(decode_sub_unsafe(""), None);
        let token = token_with_payload(&json!({"sub": "alice"}));
        assert_eq!(decode_sub_unsafe(&token), None);
        let token = token_with_payload(&json!({"sub": -3}));
        assert_eq!(decode_sub_unsafe(&token), None);
    }
}
