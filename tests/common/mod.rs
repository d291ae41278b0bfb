//! Shared test doubles and token builders.

#![allow(dead_code)]

use std::sync::RwLock;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use wicket::session::{AuthError, IdentityProvider, ProviderSession};

/// Build a compact token from header/payload JSON and a raw signature.
pub fn compact_token(header: &Value, payload: &Value, signature: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).unwrap());
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    format!("{header}.{payload}.{signature}")
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

/// Scripted identity provider. Every behavior is settable after construction;
/// errors are stored as strings and surfaced as `AuthError::Network`.
#[derive(Default)]
pub struct MockProvider {
    pub authenticated: RwLock<bool>,
    pub user: RwLock<Option<Map<String, Value>>>,
    pub check_error: RwLock<Option<String>>,
    pub exchange_error: RwLock<Option<String>>,
    pub popup_error: RwLock<Option<String>>,
    pub access_token: RwLock<Option<String>>,
    pub exchanges: RwLock<Vec<(String, String)>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_authenticated(&self, user: Map<String, Value>) {
        *self.authenticated.write().unwrap() = true;
        *self.user.write().unwrap() = Some(user);
    }

    pub fn set_check_error(&self, message: &str) {
        *self.check_error.write().unwrap() = Some(message.to_string());
    }

    pub fn set_exchange_error(&self, message: &str) {
        *self.exchange_error.write().unwrap() = Some(message.to_string());
    }

    pub fn set_popup_error(&self, message: &str) {
        *self.popup_error.write().unwrap() = Some(message.to_string());
    }

    pub fn set_access_token(&self, token: &str) {
        *self.access_token.write().unwrap() = Some(token.to_string());
    }

    pub fn exchange_calls(&self) -> Vec<(String, String)> {
        self.exchanges.read().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn check_session(&self) -> Result<ProviderSession, AuthError> {
        if let Some(message) = self.check_error.read().unwrap().clone() {
            return Err(AuthError::Network(message));
        }
        Ok(ProviderSession {
            is_authenticated: *self.authenticated.read().unwrap(),
            user: self.user.read().unwrap().clone(),
        })
    }

    fn authorize_url(&self) -> Result<String, AuthError> {
        Ok("https://idp.example/authorize?client_id=mock&state=s1".to_string())
    }

    async fn exchange_code(&self, code: &str, state: &str) -> Result<(), AuthError> {
        self.exchanges
            .write()
            .unwrap()
            .push((code.to_string(), state.to_string()));
        if let Some(message) = self.exchange_error.read().unwrap().clone() {
            return Err(AuthError::Network(message));
        }
        *self.authenticated.write().unwrap() = true;
        Ok(())
    }

    async fn login_with_popup(&self) -> Result<(), AuthError> {
        if let Some(message) = self.popup_error.read().unwrap().clone() {
            return Err(AuthError::Network(message));
        }
        *self.authenticated.write().unwrap() = true;
        Ok(())
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        self.access_token
            .read()
            .unwrap()
            .clone()
            .ok_or(AuthError::NotLoggedIn)
    }

    fn logout_url(&self, return_to: Option<&str>) -> Result<String, AuthError> {
        let mut url = "https://idp.example/v2/logout?client_id=mock".to_string();
        if let Some(target) = return_to {
            url.push_str("&returnTo=");
            url.push_str(target);
        }
        Ok(url)
    }
}
