//! Session client: the one owner of the identity-provider handle.
//!
//! Every operation that can fail converts the failure into the snapshot
//! cell's `error` field; the only errors returned to callers are the
//! `NotInitialized` guard and nothing else.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::cell::StateCell;
use crate::host::Navigator;
use crate::storage::{KeyValueStore, RETURN_TO_KEY};

use super::error::AuthError;
use super::provider::IdentityProvider;
use super::snapshot::SessionSnapshot;

/// Bridge to the identity provider. Owns the session snapshot cell; downstream
/// code subscribes to it and re-renders on each commit.
pub struct SessionClient {
    provider: RwLock<Option<Arc<dyn IdentityProvider>>>,
    snapshot: StateCell<SessionSnapshot>,
    navigator: Arc<dyn Navigator>,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionClient {
    pub fn new(navigator: Arc<dyn Navigator>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            provider: RwLock::new(None),
            snapshot: StateCell::new(SessionSnapshot::default()),
            navigator,
            storage,
        }
    }

    /// The session snapshot cell, for subscription and reads.
    pub fn snapshot_cell(&self) -> &StateCell<SessionSnapshot> {
        &self.snapshot
    }

    /// Current snapshot value.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.get()
    }

    fn provider(&self) -> Result<Arc<dyn IdentityProvider>, AuthError> {
        self.provider
            .read()
            .unwrap()
            .clone()
            .ok_or(AuthError::NotInitialized)
    }

    /// Install the provider, check session state, and, if the current URL
    /// carries an authorization code or error parameter, run the redirect
    /// callback exchange.
    pub async fn initialize(&self, provider: Arc<dyn IdentityProvider>) -> Result<(), AuthError> {
        *self.provider.write().unwrap() = Some(provider);
        self.check_state().await?;
        if has_auth_params(&self.navigator.current_url()) {
            self.handle_redirect_callback().await?;
        }
        Ok(())
    }

    /// Query the provider and fully replace the snapshot with the outcome.
    /// A failed query discards any previously cached user.
    pub async fn check_state(&self) -> Result<(), AuthError> {
        let provider = self.provider()?;
        let next = match provider.check_session().await {
            Ok(session) => SessionSnapshot::checked(session.is_authenticated, session.user),
            Err(err) => SessionSnapshot::failed(err.to_string()),
        };
        self.snapshot.replace(next);
        Ok(())
    }

    /// Exchange the authorization code in the current URL, re-check session
    /// state, and rewrite the address to the target captured before the
    /// redirect (falling back to `/`). On failure the query string is
    /// stripped from the address so the callback is not re-attempted.
    pub async fn handle_redirect_callback(&self) -> Result<(), AuthError> {
        let provider = self.provider()?;
        let current = self.navigator.current_url();
        let params = AuthParams::from_url(&current);

        if let Some(message) = params.error {
            self.record_error(message);
            self.navigator.replace(&stripped_path(&current));
            return Ok(());
        }

        let Some(code) = params.code else {
            debug!("redirect callback invoked without code or error parameter");
            return Ok(());
        };

        match provider
            .exchange_code(&code, params.state.as_deref().unwrap_or(""))
            .await
        {
            Ok(()) => {
                self.check_state().await?;
                let target = match self.storage.get(RETURN_TO_KEY) {
                    Ok(value) => {
                        let _ = self.storage.remove(RETURN_TO_KEY);
                        value
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to read return target");
                        None
                    }
                };
                self.navigator.replace(target.as_deref().unwrap_or("/"));
            }
            Err(err) => {
                self.record_error(err.to_string());
                self.navigator.replace(&stripped_path(&current));
            }
        }
        Ok(())
    }

    /// Start a provider redirect login. Fails fast when uninitialized; any
    /// other failure is recorded in the snapshot's `error` field without
    /// altering `is_authenticated`.
    pub async fn login_with_redirect(&self, target_url: Option<&str>) -> Result<(), AuthError> {
        let provider = self.provider()?;
        if let Some(target) = target_url {
            if let Err(err) = self.storage.set(RETURN_TO_KEY, target) {
                warn!(error = %err, "failed to persist return target");
            }
        }
        match provider.authorize_url() {
            Ok(url) => self.navigator.assign(&url),
            Err(err) => self.record_error(err.to_string()),
        }
        Ok(())
    }

    /// Popup login flow. `is_loading` is raised before the call and lowered
    /// after it, regardless of outcome.
    pub async fn login_with_popup(&self) -> Result<(), AuthError> {
        let provider = self.provider()?;
        self.snapshot.update(|snap| SessionSnapshot {
            is_loading: true,
            ..snap
        });
        match provider.login_with_popup().await {
            Ok(()) => self.check_state().await?,
            Err(err) => {
                self.snapshot.update(|snap| SessionSnapshot {
                    is_loading: false,
                    error: Some(err.to_string()),
                    ..snap
                });
            }
        }
        Ok(())
    }

    /// Redirect-driven logout. No local state cleanup happens here; the
    /// provider resets session state through the redirect.
    pub async fn logout(&self, return_to: Option<&str>) -> Result<(), AuthError> {
        let provider = self.provider()?;
        match provider.logout_url(return_to) {
            Ok(url) => self.navigator.assign(&url),
            Err(err) => self.record_error(err.to_string()),
        }
        Ok(())
    }

    /// Silently refreshed access token, or `None` on any failure. Logs, never
    /// returns an error.
    pub async fn get_access_token(&self) -> Option<String> {
        let provider = match self.provider() {
            Ok(provider) => provider,
            Err(err) => {
                warn!(error = %err, "access token requested before initialization");
                return None;
            }
        };
        match provider.access_token().await {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(error = %err, "failed to acquire access token");
                None
            }
        }
    }

    /// Errors are never auto-cleared; consumers clear them explicitly.
    pub fn clear_error(&self) {
        self.snapshot.update(|snap| SessionSnapshot {
            error: None,
            ..snap
        });
    }

    fn record_error(&self, message: String) {
        self.snapshot.update(|snap| SessionSnapshot {
            is_loading: false,
            error: Some(message),
            ..snap
        });
    }
}

#[derive(Debug, Default)]
struct AuthParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl AuthParams {
    fn from_url(raw: &str) -> Self {
        let Ok(url) = url::Url::parse(raw) else {
            return Self::default();
        };
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                // error_description is the human-readable form; prefer it.
                "error" => {
                    params.error.get_or_insert_with(|| value.into_owned());
                }
                "error_description" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// Whether the URL carries an authorization code or error parameter.
fn has_auth_params(raw: &str) -> bool {
    let params = AuthParams::from_url(raw);
    params.code.is_some() || params.error.is_some()
}

/// Path portion of the URL, dropping query and fragment.
fn stripped_path(raw: &str) -> String {
    url::Url::parse(raw)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| "/".to_string())
}
