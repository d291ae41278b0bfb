//! Structural token inspection.
//!
//! Splits compact (signed) and encrypted token serializations into their
//! segments without any cryptographic verification or decryption. This is a
//! diagnostic utility: callers must not treat its output as authoritative
//! content or use it as an authentication boundary.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Structural decode failures. A malformed token is a data error, so this is
/// the one part of the library that fails synchronously to its caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected exactly {expected} dot-separated segments, found {found}")]
    SegmentCount { expected: usize, found: usize },
    #[error("expected at least {minimum} dot-separated segments, found {found}")]
    TooFewSegments { minimum: usize, found: usize },
    #[error("segment {index} is not valid base64: {reason}")]
    Base64 { index: usize, reason: String },
    #[error("segment {index} is not valid JSON: {reason}")]
    Json { index: usize, reason: String },
}

/// A compact token split into its three parts. The signature is kept as the
/// raw third segment, unmodified and unverified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedToken {
    pub header: Value,
    pub payload: Value,
    pub signature: String,
}

/// An encrypted token remnant. Only the header is readable; the remaining
/// segments are retained as opaque strings and `payload` is always empty
/// because no key material is available to decrypt the ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedToken {
    pub header: Value,
    pub encrypted_key: String,
    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
    pub payload: Map<String, Value>,
}

/// Split a compact token on `.` and parse its first two segments as
/// base64-encoded JSON. Requires exactly three segments.
pub fn decode_compact_token(token: &str) -> Result<DecodedToken, DecodeError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(DecodeError::SegmentCount {
            expected: 3,
            found: parts.len(),
        });
    }
    Ok(DecodedToken {
        header: decode_json_segment(parts[0], 0)?,
        payload: decode_json_segment(parts[1], 1)?,
        signature: parts[2].to_string(),
    })
}

/// Split an encrypted token on `.` and parse only its header. Requires at
/// least four segments (five expected for a complete structure); a missing
/// fifth segment yields an empty `tag` rather than a failure.
pub fn decode_encrypted_token(token: &str) -> Result<EncryptedToken, DecodeError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() < 4 {
        return Err(DecodeError::TooFewSegments {
            minimum: 4,
            found: parts.len(),
        });
    }
    Ok(EncryptedToken {
        header: decode_json_segment(parts[0], 0)?,
        encrypted_key: parts[1].to_string(),
        iv: parts[2].to_string(),
        ciphertext: parts[3].to_string(),
        tag: parts.get(4).copied().unwrap_or_default().to_string(),
        payload: Map::new(),
    })
}

fn decode_json_segment(segment: &str, index: usize) -> Result<Value, DecodeError> {
    let bytes = decode_base64(segment).map_err(|err| DecodeError::Base64 {
        index,
        reason: err.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|err| DecodeError::Json {
        index,
        reason: err.to_string(),
    })
}

/// Tokens in the wild carry both base64url and standard alphabets, with or
/// without padding. Strip padding, then try url-safe before standard.
fn decode_base64(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode_segment(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    fn sample_compact() -> String {
        let header = encode_segment(&json!({"alg": "RS256", "typ": "JWT"}));
        let payload = encode_segment(&json!({"sub": "user-1", "name": "Ada"}));
        format!("{header}.{payload}.sig-bytes")
    }

    #[test]
    fn compact_token_decodes_header_payload_and_raw_signature() {
        let decoded = decode_compact_token(&sample_compact()).unwrap();
        assert_eq!(decoded.header["alg"], "RS256");
        assert_eq!(decoded.payload["sub"], "user-1");
        assert_eq!(decoded.signature, "sig-bytes");
    }

    #[test]
    fn compact_token_rejects_wrong_segment_count() {
        let err = decode_compact_token("only.two").unwrap_err();
        assert_eq!(
            err,
            DecodeError::SegmentCount {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn compact_token_rejects_invalid_base64() {
        let err = decode_compact_token("!!!.AAAA.sig").unwrap_err();
        assert!(matches!(err, DecodeError::Base64 { index: 0, .. }));
    }

    #[test]
    fn compact_token_rejects_non_json_segment() {
        let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
        let header = encode_segment(&json!({"alg": "none"}));
        let err = decode_compact_token(&format!("{header}.{not_json}.sig")).unwrap_err();
        assert!(matches!(err, DecodeError::Json { index: 1, .. }));
    }

    #[test]
    fn compact_token_accepts_padded_standard_base64() {
        let header = base64::engine::general_purpose::STANDARD
            .encode(serde_json::to_vec(&json!({"alg": "HS256"})).unwrap());
        let payload = encode_segment(&json!({"sub": "x"}));
        let decoded = decode_compact_token(&format!("{header}.{payload}.s")).unwrap();
        assert_eq!(decoded.header["alg"], "HS256");
    }

    #[test]
    fn encrypted_token_keeps_opaque_segments_and_empty_payload() {
        let header = encode_segment(&json!({"alg": "RSA-OAEP", "enc": "A256GCM"}));
        let token = format!("{header}.cek.iv.ct.tag");
        let decoded = decode_encrypted_token(&token).unwrap();
        assert_eq!(decoded.header["enc"], "A256GCM");
        assert_eq!(decoded.encrypted_key, "cek");
        assert_eq!(decoded.iv, "iv");
        assert_eq!(decoded.ciphertext, "ct");
        assert_eq!(decoded.tag, "tag");
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn encrypted_token_tolerates_missing_tag() {
        let header = encode_segment(&json!({"alg": "dir"}));
        let decoded = decode_encrypted_token(&format!("{header}.k.iv.ct")).unwrap();
        assert_eq!(decoded.tag, "");
    }

    #[test]
    fn encrypted_token_rejects_three_segments() {
        let err = decode_encrypted_token("a.b.c").unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooFewSegments {
                minimum: 4,
                found: 3
            }
        );
    }
}
