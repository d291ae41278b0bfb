//! Composition root.
//!
//! Every state cell is owned here and reached through read accessors and
//! named mutation functions on the components — nothing in the crate is an
//! ambient singleton.

use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::host::Navigator;
use crate::profile::ProfileAggregator;
use crate::session::{IdentityProvider, OidcHttpProvider, SessionClient};
use crate::storage::{FileStore, KeyValueStore};
use crate::theme::{NullTarget, ThemeStore, ThemeTarget};

/// Wires config → provider → session client → profile aggregator → theme
/// store. Component lifetimes equal the runtime's lifetime; there is no
/// explicit teardown.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use wicket::config::ProviderConfig;
/// use wicket::host::MemoryNavigator;
/// use wicket::runtime::Runtime;
///
/// # async fn example() -> wicket::error::Result<()> {
/// let config = ProviderConfig::new("tenant.example.auth", "client-123", "https://app.example/");
/// let navigator = Arc::new(MemoryNavigator::new("https://app.example/"));
/// let runtime = Runtime::builder(config, navigator).build();
/// runtime.initialize().await?;
/// # Ok(())
/// # }
/// ```
pub struct Runtime {
    config: ProviderConfig,
    storage: Arc<dyn KeyValueStore>,
    session: Arc<SessionClient>,
    tokens: Arc<ProfileAggregator>,
    theme: Arc<ThemeStore>,
}

pub struct RuntimeBuilder {
    config: ProviderConfig,
    navigator: Arc<dyn Navigator>,
    storage: Option<Arc<dyn KeyValueStore>>,
    theme_target: Option<Arc<dyn ThemeTarget>>,
    userinfo_url: Option<String>,
}

impl RuntimeBuilder {
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn theme_target(mut self, target: Arc<dyn ThemeTarget>) -> Self {
        self.theme_target = Some(target);
        self
    }

    /// Override the userinfo endpoint (tests).
    pub fn userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = Some(url.into());
        self
    }

    pub fn build(self) -> Runtime {
        let storage = self.storage.unwrap_or_else(|| {
            Arc::new(match &self.config.cache_dir {
                Some(dir) => FileStore::new(dir.clone()),
                None => FileStore::new_default(),
            })
        });
        let session = Arc::new(SessionClient::new(
            Arc::clone(&self.navigator),
            Arc::clone(&storage),
        ));
        let userinfo_url = self
            .userinfo_url
            .unwrap_or_else(|| self.config.userinfo_url());
        let tokens = Arc::new(ProfileAggregator::new(
            Arc::clone(&session),
            Arc::clone(&storage),
            userinfo_url,
        ));
        let theme = Arc::new(ThemeStore::new(
            Arc::clone(&storage),
            self.theme_target.unwrap_or_else(|| Arc::new(NullTarget)),
        ));
        Runtime {
            config: self.config,
            storage,
            session,
            tokens,
            theme,
        }
    }
}

impl Runtime {
    pub fn builder(config: ProviderConfig, navigator: Arc<dyn Navigator>) -> RuntimeBuilder {
        RuntimeBuilder {
            config,
            navigator,
            storage: None,
            theme_target: None,
            userinfo_url: None,
        }
    }

    /// Construct the HTTP provider from the config and run the session
    /// client's initialization (state check plus redirect callback).
    pub async fn initialize(&self) -> Result<()> {
        let provider = Arc::new(OidcHttpProvider::new(self.config.clone()));
        self.initialize_with(provider).await
    }

    /// Initialize with an externally constructed provider.
    pub async fn initialize_with(&self, provider: Arc<dyn IdentityProvider>) -> Result<()> {
        self.session.initialize(provider).await?;
        Ok(())
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    pub fn session(&self) -> &Arc<SessionClient> {
        &self.session
    }

    pub fn tokens(&self) -> &Arc<ProfileAggregator> {
        &self.tokens
    }

    pub fn theme(&self) -> &Arc<ThemeStore> {
        &self.theme
    }
}
