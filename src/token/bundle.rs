//! The token bundle: decoded/fetched token and profile data.
//!
//! Lifecycle-managed independently from the session snapshot — it is populated
//! on demand by the profile aggregator rather than kept in sync with the
//! provider's session state, so the two may disagree transiently.

use serde_json::{Map, Value};

use super::decode::{DecodedToken, EncryptedToken};

/// Whole-value state of the token cell. Committed atomically; readers never
/// observe a partially populated bundle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBundle {
    /// Raw compact access token, as returned by the provider.
    pub access_token: Option<String>,
    /// Raw compact ID token, read from persisted storage.
    pub id_token: Option<String>,
    pub decoded_access_token: Option<DecodedToken>,
    pub decoded_id_token: Option<DecodedToken>,
    /// Raw encrypted-token remnant, read from persisted storage.
    pub jwe_token: Option<String>,
    /// Structural inspection of the remnant; its payload is always empty.
    pub decoded_jwe: Option<EncryptedToken>,
    /// Record fetched from the remote userinfo endpoint.
    pub user_info: Option<Map<String, Value>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl TokenBundle {
    /// The empty shape: every field cleared, not loading, no error.
    pub fn cleared() -> Self {
        Self::default()
    }

    /// ID-token claims as an object, when present and object-shaped.
    pub fn id_claims(&self) -> Option<&Map<String, Value>> {
        self.decoded_id_token
            .as_ref()
            .and_then(|decoded| decoded.payload.as_object())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cleared_bundle_is_fully_empty() {
        let bundle = TokenBundle::cleared();
        assert!(bundle.access_token.is_none());
        assert!(bundle.decoded_id_token.is_none());
        assert!(bundle.user_info.is_none());
        assert!(!bundle.loading);
        assert!(bundle.error.is_none());
    }

    #[test]
    fn id_claims_requires_object_payload() {
        let mut bundle = TokenBundle::default();
        bundle.decoded_id_token = Some(DecodedToken {
            header: json!({"alg": "RS256"}),
            payload: json!("not an object"),
            signature: "sig".to_string(),
        });
        assert!(bundle.id_claims().is_none());

        bundle.decoded_id_token = Some(DecodedToken {
            header: json!({"alg": "RS256"}),
            payload: json!({"sub": "user-1"}),
            signature: "sig".to_string(),
        });
        assert_eq!(bundle.id_claims().unwrap()["sub"], "user-1");
    }
}
