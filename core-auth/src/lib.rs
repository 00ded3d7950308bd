//! # Authentication Module
//!
//! Bearer credentials for catalog sync runs.
//!
//! ## Overview
//!
//! Two credential sources are supported:
//!
//! - **App**: the configured client id/secret exchanged through the OAuth 2.0
//!   client-credentials grant ([`ClientCredentialsFlow`])
//! - **User**: the provider token a user delegated to the platform, fetched
//!   from the user registry
//!
//! Every [`Credential`] carries an expiry. [`CredentialProvider::ensure_fresh`]
//! re-acquires a credential of the same kind once it is inside the expiry
//! buffer. Credentials are owned by the run that requested them and are never
//! persisted or shared.

pub mod error;
pub mod oauth;
pub mod provider;
pub mod types;

pub use error::{AuthError, Result};
pub use oauth::{ClientCredentialsConfig, ClientCredentialsFlow};
pub use provider::{CredentialProvider, DefaultCredentialProvider};
pub use types::{Credential, CredentialKind, ProviderKind};
