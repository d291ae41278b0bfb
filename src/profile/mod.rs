//! Profile aggregation: the token bundle cell, its on-demand population, and
//! the merged user-profile derivation.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cell::StateCell;
use crate::error::WicketError;
use crate::session::{AuthError, SessionClient};
use crate::storage::{KeyValueStore, ID_TOKEN_KEY, JWE_TOKEN_KEY};
use crate::token::{decode_compact_token, decode_encrypted_token, TokenBundle};

/// Merged user-profile view: ID-token claims form the base, and a fetched
/// userinfo record overrides and extends them. When userinfo is absent the
/// claims are applied twice — harmless and idempotent — rather than leaving
/// the view partially populated.
pub fn user_profile(bundle: &TokenBundle) -> Option<Map<String, Value>> {
    let claims = bundle.id_claims();
    let overlay = bundle.user_info.as_ref().or(claims);
    match (claims, overlay) {
        (None, None) => None,
        (claims, overlay) => {
            let mut profile = claims.cloned().unwrap_or_default();
            if let Some(overlay) = overlay {
                for (key, value) in overlay {
                    profile.insert(key.clone(), value.clone());
                }
            }
            Some(profile)
        }
    }
}

/// Owns the token bundle cell and the derived profile cell.
///
/// The bundle's lifecycle is independent of the session snapshot: it is
/// populated on demand by [`ProfileAggregator::load_auth_tokens`], never kept
/// in sync automatically, so the two can disagree transiently.
pub struct ProfileAggregator {
    bundle: StateCell<TokenBundle>,
    profile: StateCell<Option<Map<String, Value>>>,
    session: Arc<SessionClient>,
    storage: Arc<dyn KeyValueStore>,
    client: reqwest::Client,
    userinfo_url: String,
}

impl ProfileAggregator {
    pub fn new(
        session: Arc<SessionClient>,
        storage: Arc<dyn KeyValueStore>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        let bundle = StateCell::new(TokenBundle::default());
        let profile = StateCell::new(None);
        let derived = profile.clone();
        bundle.subscribe(move |committed: &TokenBundle| {
            derived.replace(user_profile(committed));
        });
        Self {
            bundle,
            profile,
            session,
            storage,
            client: reqwest::Client::new(),
            userinfo_url: userinfo_url.into(),
        }
    }

    /// The token bundle cell, for subscription and reads.
    pub fn bundle_cell(&self) -> &StateCell<TokenBundle> {
        &self.bundle
    }

    /// Current bundle value.
    pub fn bundle(&self) -> TokenBundle {
        self.bundle.get()
    }

    /// The derived profile cell; recomputed on every bundle commit.
    pub fn profile_cell(&self) -> &StateCell<Option<Map<String, Value>>> {
        &self.profile
    }

    /// Current derived profile.
    pub fn profile(&self) -> Option<Map<String, Value>> {
        self.profile.get()
    }

    /// Populate the bundle: acquire an access token, decode it, read and
    /// decode the persisted ID token and encrypted remnant, fetch userinfo,
    /// and commit the whole bundle atomically.
    ///
    /// No access token clears the bundle entirely; that is not an error. A
    /// decode or storage failure preserves the prior fields and sets only
    /// `loading` and `error`. Never returns an error itself. Overlapping
    /// calls are not serialized: last commit wins.
    pub async fn load_auth_tokens(&self) {
        self.bundle.update(|bundle| TokenBundle {
            loading: true,
            ..bundle
        });
        match self.assemble().await {
            Ok(next) => {
                self.bundle.replace(next);
            }
            Err(err) => {
                warn!(error = %err, "token load failed");
                self.bundle.update(|bundle| TokenBundle {
                    loading: false,
                    error: Some(err.to_string()),
                    ..bundle
                });
            }
        }
    }

    async fn assemble(&self) -> Result<TokenBundle, WicketError> {
        let Some(access_token) = self.session.get_access_token().await else {
            debug!("no access token available; clearing token bundle");
            return Ok(TokenBundle::cleared());
        };
        let decoded_access_token = decode_compact_token(&access_token)?;

        let id_token = self.storage.get(ID_TOKEN_KEY)?;
        let decoded_id_token = id_token
            .as_deref()
            .map(decode_compact_token)
            .transpose()?;

        let jwe_token = self.storage.get(JWE_TOKEN_KEY)?;
        let decoded_jwe = jwe_token
            .as_deref()
            .map(decode_encrypted_token)
            .transpose()?;

        // Userinfo failure is local: the claims stand in for the record.
        let user_info = match self.fetch_userinfo(&access_token).await {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, "userinfo fetch failed; falling back to ID-token claims");
                None
            }
        };
        let final_user_info = user_info.or_else(|| {
            decoded_id_token
                .as_ref()
                .and_then(|decoded| decoded.payload.as_object().cloned())
        });

        Ok(TokenBundle {
            access_token: Some(access_token),
            id_token,
            decoded_access_token: Some(decoded_access_token),
            decoded_id_token,
            jwe_token,
            decoded_jwe,
            user_info: final_user_info,
            loading: false,
            error: None,
        })
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<Map<String, Value>, AuthError> {
        let resp = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "Userinfo request failed with status {}",
                resp.status()
            )));
        }
        let value: Value = resp.json().await?;
        value
            .as_object()
            .cloned()
            .ok_or_else(|| AuthError::InvalidResponse("userinfo payload is not an object".into()))
    }

    /// Reset the bundle to its empty shape and drop the persisted token keys.
    /// The session snapshot is untouched.
    pub fn clear_auth_tokens(&self) {
        self.bundle.replace(TokenBundle::cleared());
        for key in [ID_TOKEN_KEY, JWE_TOKEN_KEY] {
            if let Err(err) = self.storage.remove(key) {
                warn!(error = %err, key, "failed to remove persisted token");
            }
        }
    }
}
