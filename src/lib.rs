//! Wicket — reactive session/token state for OAuth2/OIDC app flows.
//!
//! Structure: a session client wraps an identity provider behind a trait seam
//! and owns a snapshot cell; a profile aggregator populates a token bundle
//! cell on demand and derives a merged user profile; a theme store keeps a
//! persisted UI preference cell with an apply effect. All cells mutate by
//! whole-value replacement and notify subscribers synchronously.
//!
//! Token decoding here is structural only — no signature verification, no
//! decryption. It is a diagnostic surface, not an authentication boundary.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use wicket::prelude::*;
//! use wicket::host::MemoryNavigator;
//!
//! # async fn example() -> wicket::error::Result<()> {
//! let config = ProviderConfig::from_env()?;
//! let navigator = Arc::new(MemoryNavigator::new("https://app.example/"));
//! let runtime = Runtime::builder(config, navigator).build();
//! runtime.initialize().await?;
//! runtime.tokens().load_auth_tokens().await;
//! if let Some(profile) = runtime.tokens().profile() {
//!     println!("hello {:?}", profile.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod cell;
pub mod config;
pub mod error;
pub mod host;
pub mod prelude;
pub mod profile;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod theme;
pub mod token;
