//! Authentication module
//!
//! Supports: Bearer tokens, Google service accounts (signed JWT exchange),
//! gcloud authorized-user refresh tokens and the GCE metadata server.
//!
//! The `Authenticator` applies credentials to requests and caches access
//! tokens until shortly before they expire. `resolve_credentials` discovers
//! application-default credentials from the environment.

mod authenticator;
mod credentials;
mod types;

pub use authenticator::Authenticator;
pub use credentials::{
    resolve_credentials, resolve_credentials_with, CredentialsFile, BIGQUERY_SCOPE,
    DEFAULT_TOKEN_URI, METADATA_TOKEN_URL,
};
pub use types::{AuthConfig, CachedToken};
