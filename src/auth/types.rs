//! Auth configuration types

use chrono::{DateTime, Utc};

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Static bearer token
    Bearer {
        /// The bearer token
        token: String,
    },

    /// Service account: RS256-signed JWT exchanged for an access token
    ServiceAccount {
        /// Service account email (iss claim)
        client_email: String,
        /// Private key for signing (PEM format)
        private_key: String,
        /// Token endpoint (aud claim and exchange URL)
        token_uri: String,
        /// Requested scopes
        scopes: Vec<String>,
    },

    /// gcloud user credentials: OAuth2 refresh token flow
    AuthorizedUser {
        /// Token endpoint URL
        token_uri: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Refresh token
        refresh_token: String,
    },

    /// Compute Engine metadata server
    MetadataServer {
        /// Token URL on the metadata server
        token_url: String,
    },
}

impl AuthConfig {
    /// Short name of the credential kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::ServiceAccount { .. } => "service_account",
            AuthConfig::AuthorizedUser { .. } => "authorized_user",
            AuthConfig::MetadataServer { .. } => "metadata_server",
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_cached_token_not_expired() {
        let token = CachedToken::expires_in("test".to_string(), 3600);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_cached_token_expired() {
        let token = CachedToken::expires_in("test".to_string(), -100);
        assert!(token.is_expired());
    }

    #[test]
    fn test_cached_token_within_buffer() {
        let token = CachedToken::expires_in("test".to_string(), 10);
        assert!(token.is_expired());
    }

    #[test]
    fn test_cached_token_no_expiration() {
        let token = CachedToken::new("test".to_string(), None);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_auth_config_kind() {
        assert_eq!(AuthConfig::default().kind(), "none");
        assert_eq!(
            AuthConfig::MetadataServer {
                token_url: String::new()
            }
            .kind(),
            "metadata_server"
        );
    }
}
