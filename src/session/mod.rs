//! Session snapshot cell and the identity-provider client.

pub mod client;
pub mod error;
pub mod provider;
pub mod snapshot;

pub use client::SessionClient;
pub use error::AuthError;
pub use provider::{IdentityProvider, OidcHttpProvider, ProviderSession};
pub use snapshot::SessionSnapshot;
