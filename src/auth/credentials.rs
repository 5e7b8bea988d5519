//! Application-default credentials discovery
//!
//! Resolution order:
//! 1. An explicit credentials file
//! 2. `GOOGLE_OAUTH_ACCESS_TOKEN` (used as a bearer token)
//! 3. `GOOGLE_APPLICATION_CREDENTIALS` (path to a credentials file)
//! 4. The gcloud well-known file (`application_default_credentials.json`)
//! 5. The Compute Engine metadata server

use super::types::AuthConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// OAuth scope for BigQuery
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

/// Google's OAuth2 token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Metadata server token URL for the default service account
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const ADC_FILE_NAME: &str = "application_default_credentials.json";

/// Contents of a Google credentials JSON file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    /// Service account key file
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
    /// Output of `gcloud auth application-default login`
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl CredentialsFile {
    /// Read and parse a credentials file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::auth(format!(
                "Failed to read credentials file {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::auth(format!(
                "Invalid credentials file {}: {e}",
                path.display()
            ))
        })
    }

    /// Convert into an auth config requesting the BigQuery scope
    pub fn into_auth_config(self) -> AuthConfig {
        match self {
            CredentialsFile::ServiceAccount {
                client_email,
                private_key,
                token_uri,
            } => AuthConfig::ServiceAccount {
                client_email,
                private_key,
                token_uri,
                scopes: vec![BIGQUERY_SCOPE.to_string()],
            },
            CredentialsFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => AuthConfig::AuthorizedUser {
                token_uri,
                client_id,
                client_secret,
                refresh_token,
            },
        }
    }
}

/// Resolve credentials from the process environment
pub fn resolve_credentials(explicit: Option<&Path>) -> Result<AuthConfig> {
    resolve_credentials_with(explicit, |key| std::env::var(key).ok())
}

/// Resolve credentials using `env` to look up environment variables
pub fn resolve_credentials_with<F>(explicit: Option<&Path>, env: F) -> Result<AuthConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(path) = explicit {
        info!("Using credentials file {}", path.display());
        return Ok(CredentialsFile::from_file(path)?.into_auth_config());
    }

    if let Some(token) = env("GOOGLE_OAUTH_ACCESS_TOKEN") {
        info!("Using access token from GOOGLE_OAUTH_ACCESS_TOKEN");
        return Ok(AuthConfig::Bearer { token });
    }

    if let Some(path) = env("GOOGLE_APPLICATION_CREDENTIALS") {
        info!("Using credentials file from GOOGLE_APPLICATION_CREDENTIALS: {path}");
        return Ok(CredentialsFile::from_file(path)?.into_auth_config());
    }

    if let Some(path) = well_known_file(&env) {
        if path.is_file() {
            info!("Using gcloud application default credentials");
            return Ok(CredentialsFile::from_file(path)?.into_auth_config());
        }
        debug!("No gcloud credentials at {}", path.display());
    }

    let token_url = match env("GCE_METADATA_HOST") {
        Some(host) => format!(
            "http://{host}/computeMetadata/v1/instance/service-accounts/default/token"
        ),
        None => METADATA_TOKEN_URL.to_string(),
    };
    info!("Falling back to the metadata server for credentials");
    Ok(AuthConfig::MetadataServer { token_url })
}

/// Location of the gcloud application-default credentials file
fn well_known_file<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = env("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(dir).join(ADC_FILE_NAME));
    }

    if cfg!(windows) {
        env("APPDATA").map(|dir| PathBuf::from(dir).join("gcloud").join(ADC_FILE_NAME))
    } else {
        env("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("gcloud")
                .join(ADC_FILE_NAME)
        })
    }
}
