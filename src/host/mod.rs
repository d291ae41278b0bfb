//! Host environment capabilities.
//!
//! Browser facilities are expressed as capability-provider interfaces: value
//! objects exposing the available actions and flags. Presentation code becomes
//! a pure function of these interfaces, and tests substitute in-memory doubles.

use std::sync::RwLock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Capability unavailable: {0}")]
    Unavailable(String),
    #[error("Host operation failed: {0}")]
    Failed(String),
}

/// Address-bar control: the session client reads the current URL during
/// initialization and rewrites it after redirect callbacks.
pub trait Navigator: Send + Sync {
    /// Full current URL, including any query string.
    fn current_url(&self) -> String;
    /// Navigate away (login redirect, logout).
    fn assign(&self, url: &str);
    /// Rewrite the address without navigating (history replacement).
    fn replace(&self, url: &str);
}

/// Clipboard write access.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), HostError>;
}

/// Payload for the share capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareData {
    pub title: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
}

/// Native share sheet, when the host offers one.
pub trait Share: Send + Sync {
    fn can_share(&self, data: &ShareData) -> bool;
    fn share(&self, data: &ShareData) -> Result<(), HostError>;
}

/// Outcome of an install prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
}

/// Deferred app-install prompt, when the host captured one.
pub trait InstallPrompt: Send + Sync {
    fn available(&self) -> bool;
    fn prompt(&self) -> Result<InstallOutcome, HostError>;
}

/// In-memory navigator double: records every navigation.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    current: RwLock<String>,
    history: RwLock<Vec<Navigation>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Assign(String),
    Replace(String),
}

impl MemoryNavigator {
    pub fn new(current_url: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(current_url.into()),
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn history(&self) -> Vec<Navigation> {
        self.history.read().unwrap().clone()
    }

    pub fn set_current(&self, url: impl Into<String>) {
        *self.current.write().unwrap() = url.into();
    }
}

impl Navigator for MemoryNavigator {
    fn current_url(&self) -> String {
        self.current.read().unwrap().clone()
    }

    fn assign(&self, url: &str) {
        *self.current.write().unwrap() = url.to_string();
        self.history
            .write()
            .unwrap()
            .push(Navigation::Assign(url.to_string()));
    }

    fn replace(&self, url: &str) {
        *self.current.write().unwrap() = url.to_string();
        self.history
            .write()
            .unwrap()
            .push(Navigation::Replace(url.to_string()));
    }
}

/// Clipboard double that buffers the last written text.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    last: RwLock<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_written(&self) -> Option<String> {
        self.last.read().unwrap().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), HostError> {
        *self.last.write().unwrap() = Some(text.to_string());
        Ok(())
    }
}

/// Share double that records every accepted payload.
#[derive(Debug, Default)]
pub struct MemoryShare {
    shared: RwLock<Vec<ShareData>>,
}

impl MemoryShare {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> Vec<ShareData> {
        self.shared.read().unwrap().clone()
    }
}

impl Share for MemoryShare {
    fn can_share(&self, data: &ShareData) -> bool {
        data.title.is_some() || data.text.is_some() || data.url.is_some()
    }

    fn share(&self, data: &ShareData) -> Result<(), HostError> {
        if !self.can_share(data) {
            return Err(HostError::Failed("share payload is empty".to_string()));
        }
        self.shared.write().unwrap().push(data.clone());
        Ok(())
    }
}

/// Install-prompt double with a scripted outcome. Deferred prompts are
/// one-shot: the outcome is consumed by the first `prompt` call.
#[derive(Debug, Default)]
pub struct MemoryInstallPrompt {
    outcome: RwLock<Option<InstallOutcome>>,
}

impl MemoryInstallPrompt {
    /// A prompt that will resolve with the given outcome.
    pub fn with_outcome(outcome: InstallOutcome) -> Self {
        Self {
            outcome: RwLock::new(Some(outcome)),
        }
    }

    /// A host that never captured an install prompt.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl InstallPrompt for MemoryInstallPrompt {
    fn available(&self) -> bool {
        self.outcome.read().unwrap().is_some()
    }

    fn prompt(&self) -> Result<InstallOutcome, HostError> {
        self.outcome
            .write()
            .unwrap()
            .take()
            .ok_or_else(|| HostError::Unavailable("no deferred install prompt".to_string()))
    }
}
