//! Convenience re-exports for common use.

pub use crate::cell::StateCell;
pub use crate::config::ProviderConfig;
pub use crate::error::{Result, WicketError};
pub use crate::host::{Clipboard, InstallOutcome, InstallPrompt, Navigator, Share, ShareData};
pub use crate::profile::{user_profile, ProfileAggregator};
pub use crate::runtime::Runtime;
pub use crate::session::{
    AuthError, IdentityProvider, OidcHttpProvider, SessionClient, SessionSnapshot,
};
pub use crate::storage::KeyValueStore;
pub use crate::theme::{ThemeConfig, ThemeMode, ThemeStore, ThemeUpdate};
pub use crate::token::{
    decode_compact_token, decode_encrypted_token, DecodedToken, EncryptedToken, TokenBundle,
};
