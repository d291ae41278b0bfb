use serde_json::{Map, Value};

/// Current authentication status as observed from the identity provider.
///
/// `error` and `is_authenticated` may coexist: the provider can confirm a
/// session while a later operation (a token refresh, say) fails and records
/// only `error`. Errors are cleared explicitly, never automatically.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// True while an auth check or redirect-callback exchange is in flight.
    pub is_loading: bool,
    pub is_authenticated: bool,
    /// Raw profile fields from the identity provider; absent until
    /// authenticated.
    pub user: Option<Map<String, Value>>,
    pub error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            is_loading: true,
            is_authenticated: false,
            user: None,
            error: None,
        }
    }
}

impl SessionSnapshot {
    /// Snapshot after a successful provider query.
    pub fn checked(is_authenticated: bool, user: Option<Map<String, Value>>) -> Self {
        Self {
            is_loading: false,
            is_authenticated,
            user,
            error: None,
        }
    }

    /// Snapshot after a failed provider query. Prior `user` is discarded:
    /// the check fully replaces the snapshot, it never partially merges.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_loading: false,
            is_authenticated: false,
            user: None,
            error: Some(message.into()),
        }
    }
}
