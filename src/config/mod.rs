//! Provider configuration (code > env > config file).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::WicketError;

const DEFAULT_SCOPES: &[&str] = &["openid", "profile", "email"];

/// Identity-provider connection settings.
///
/// `domain` is the provider host (`tenant.example.auth`); it may also carry an
/// explicit `http(s)://` scheme, which is handy when pointing at a local mock
/// server.
///
/// # Example
/// ```
/// use wicket::config::ProviderConfig;
///
/// let config = ProviderConfig::new("tenant.example.auth", "client-123", "https://app.example/")
///     .with_audience("https://api.example")
///     .with_scopes(["openid", "profile"]);
/// assert_eq!(config.scope(), "openid profile");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub domain: String,
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_true")]
    pub use_refresh_tokens: bool,
    /// Base directory for the file-backed storage seam.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl ProviderConfig {
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            audience: None,
            scopes: default_scopes(),
            use_refresh_tokens: true,
            cache_dir: None,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_refresh_tokens(mut self, enabled: bool) -> Self {
        self.use_refresh_tokens = enabled;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Load from environment variables (WICKET_DOMAIN, WICKET_CLIENT_ID,
    /// WICKET_REDIRECT_URI, optionally WICKET_AUDIENCE and WICKET_SCOPE).
    pub fn from_env() -> Result<Self, WicketError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let domain = require_env("WICKET_DOMAIN")?;
        let client_id = require_env("WICKET_CLIENT_ID")?;
        let redirect_uri = require_env("WICKET_REDIRECT_URI")?;
        let mut config = Self::new(domain, client_id, redirect_uri);
        if let Ok(audience) = std::env::var("WICKET_AUDIENCE") {
            config.audience = Some(audience);
        }
        if let Ok(scope) = std::env::var("WICKET_SCOPE") {
            config.scopes = scope.split_whitespace().map(String::from).collect();
        }
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WicketError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|err| {
            WicketError::Configuration(format!("invalid config at {}: {err}", path.display()))
        })
    }

    /// Space-joined scope string for authorize/token requests.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// Provider base URL; a bare domain gets the https scheme.
    pub fn issuer_url(&self) -> String {
        if self.domain.starts_with("http://") || self.domain.starts_with("https://") {
            self.domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.domain.trim_end_matches('/'))
        }
    }

    /// Userinfo endpoint derived from the issuer.
    pub fn userinfo_url(&self) -> String {
        format!("{}/userinfo", self.issuer_url())
    }
}

fn require_env(name: &str) -> Result<String, WicketError> {
    std::env::var(name)
        .map_err(|_| WicketError::Configuration(format!("environment variable {name} not set")))
}
