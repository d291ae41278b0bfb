//! Identity-provider seam.
//!
//! The provider SDK is an external collaborator; [`IdentityProvider`] is the
//! boundary the session client talks through. [`OidcHttpProvider`] is a
//! reqwest-backed implementation of the standard OAuth2/OIDC surface:
//! PKCE authorize URLs, authorization-code exchange, refresh-token renewal,
//! and redirect-driven logout.

use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::token::decode_compact_token;

use super::error::AuthError;

/// Session state as reported by the provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderSession {
    pub is_authenticated: bool,
    pub user: Option<Map<String, Value>>,
}

/// Operations the session client needs from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Query current authentication state and user identity.
    async fn check_session(&self) -> Result<ProviderSession, AuthError>;

    /// Build the authorization redirect URL, opening a new login transaction.
    fn authorize_url(&self) -> Result<String, AuthError>;

    /// Exchange an authorization code delivered to the redirect URI.
    async fn exchange_code(&self, code: &str, state: &str) -> Result<(), AuthError>;

    /// Interactive in-page popup flow, where the host supports one.
    async fn login_with_popup(&self) -> Result<(), AuthError>;

    /// Silently renewed access token.
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Logout URL; the provider resets session state via the redirect.
    fn logout_url(&self, return_to: Option<&str>) -> Result<String, AuthError>;
}

#[derive(Debug, Clone)]
struct ProviderTokens {
    access_token: String,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl ProviderTokens {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

#[derive(Debug)]
struct PkceTransaction {
    state: String,
    verifier: String,
}

/// HTTP implementation of the OIDC authorization-code + PKCE flow.
///
/// # Example
/// ```no_run
/// use wicket::config::ProviderConfig;
/// use wicket::session::{IdentityProvider, OidcHttpProvider};
///
/// let config = ProviderConfig::new("tenant.example.auth", "client-123", "https://app.example/");
/// let provider = OidcHttpProvider::new(config);
/// let url = provider.authorize_url()?;
/// # Ok::<(), wicket::session::AuthError>(())
/// ```
pub struct OidcHttpProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    base_url: String,
    tokens: RwLock<Option<ProviderTokens>>,
    pending: Mutex<Option<PkceTransaction>>,
}

impl OidcHttpProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let base_url = config.issuer_url();
        Self {
            client: reqwest::Client::new(),
            config,
            base_url,
            tokens: RwLock::new(None),
            pending: Mutex::new(None),
        }
    }

    /// Point all endpoints at a different base URL (tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    fn store_tokens(&self, payload: TokenResponse) {
        let expires_at = payload
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        // Refresh responses may omit the refresh token; keep the old one.
        let previous_refresh = self
            .tokens
            .read()
            .unwrap()
            .as_ref()
            .and_then(|t| t.refresh_token.clone());
        *self.tokens.write().unwrap() = Some(ProviderTokens {
            access_token: payload.access_token,
            id_token: payload.id_token,
            refresh_token: payload.refresh_token.or(previous_refresh),
            expires_at,
        });
    }

    async fn post_token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let resp = self
            .client
            .post(self.token_url())
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "Token request failed with status {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let payload = self
            .post_token_request(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", refresh_token),
            ])
            .await?;
        let access = payload.access_token.clone();
        self.store_tokens(payload);
        Ok(access)
    }

    /// Claims from the stored ID token, when it parses as an object. The
    /// decode is structural only; a malformed ID token just yields no claims.
    fn user_claims(&self) -> Option<Map<String, Value>> {
        let guard = self.tokens.read().unwrap();
        let id_token = guard.as_ref()?.id_token.as_deref()?;
        decode_compact_token(id_token)
            .ok()
            .and_then(|decoded| decoded.payload.as_object().cloned())
    }
}

#[async_trait]
impl IdentityProvider for OidcHttpProvider {
    async fn check_session(&self) -> Result<ProviderSession, AuthError> {
        let authenticated = {
            let guard = self.tokens.read().unwrap();
            guard.as_ref().is_some_and(|t| !t.expired())
        };
        if !authenticated {
            return Ok(ProviderSession::default());
        }
        Ok(ProviderSession {
            is_authenticated: true,
            user: self.user_claims(),
        })
    }

    fn authorize_url(&self) -> Result<String, AuthError> {
        let state = Uuid::new_v4().simple().to_string();
        let verifier = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

        let mut url = url::Url::parse(&format!("{}/authorize", self.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("scope", &self.config.scope())
                .append_pair("state", &state)
                .append_pair("code_challenge", &challenge)
                .append_pair("code_challenge_method", "S256");
            if let Some(audience) = &self.config.audience {
                query.append_pair("audience", audience);
            }
            if self.config.use_refresh_tokens {
                query.append_pair("prompt", "consent");
            }
        }

        *self.pending.lock().unwrap() = Some(PkceTransaction { state, verifier });
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str, state: &str) -> Result<(), AuthError> {
        let transaction = self
            .pending
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| AuthError::InvalidResponse("no login transaction in progress".into()))?;
        if transaction.state != state {
            return Err(AuthError::InvalidResponse(
                "state parameter does not match login transaction".into(),
            ));
        }
        let payload = self
            .post_token_request(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code_verifier", transaction.verifier.as_str()),
            ])
            .await?;
        self.store_tokens(payload);
        Ok(())
    }

    async fn login_with_popup(&self) -> Result<(), AuthError> {
        Err(AuthError::Unsupported(
            "popup login requires a host-managed window".into(),
        ))
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        let (current, refresh_token) = {
            let guard = self.tokens.read().unwrap();
            match guard.as_ref() {
                Some(tokens) if !tokens.expired() => (Some(tokens.access_token.clone()), None),
                Some(tokens) => (None, tokens.refresh_token.clone()),
                None => return Err(AuthError::NotLoggedIn),
            }
        };
        if let Some(token) = current {
            return Ok(token);
        }
        match refresh_token {
            Some(refresh) if self.config.use_refresh_tokens => self.refresh(&refresh).await,
            _ => Err(AuthError::NotLoggedIn),
        }
    }

    fn logout_url(&self, return_to: Option<&str>) -> Result<String, AuthError> {
        *self.tokens.write().unwrap() = None;
        let mut url = url::Url::parse(&format!("{}/v2/logout", self.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            if let Some(target) = return_to {
                query.append_pair("returnTo", target);
            }
        }
        Ok(url.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
