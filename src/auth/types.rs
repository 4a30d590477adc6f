//! Credential and session types shared across the auth module.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Access + refresh credential pair issued by the storefront backend.
///
/// Both tokens are opaque to this crate. The pair is persisted as a single
/// unit: it is either fully present in the credential store or fully absent,
/// never half-written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived token attached to individual requests
    pub access: String,

    /// Longer-lived token used only to mint a new access token
    pub refresh: String,
}

impl TokenPair {
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self { access: access.into(), refresh: refresh.into() }
    }
}

/// Token response from the auth endpoints (`login/`, `token/refresh/`).
///
/// The refresh endpoint may rotate the refresh token; when it does not, the
/// caller keeps using the one it already holds.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Process-wide authentication status, derived from the credential store and
/// the refresh coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Startup state, before the stored credentials have been checked
    Unknown,
    /// A credential pair is held and believed valid
    Authenticated,
    /// No usable credentials; the user must log in again
    Unauthenticated,
}

/// Connection settings shared by the auth client and the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront backend (e.g. `https://shop.example.com`)
    pub base_url: String,

    /// Transport timeout applied to every request
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with the default 30 second timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the transport timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join a path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::types.
    use super::*;

    #[test]
    fn token_pair_roundtrips_through_json() {
        let pair = TokenPair::new("acc", "ref");
        let json = serde_json::to_string(&pair).unwrap();
        let back: TokenPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
    }

    #[test]
    fn token_response_refresh_is_optional() {
        let rotated: TokenResponse =
            serde_json::from_str(r#"{"access":"a2","refresh":"r2"}"#).unwrap();
        assert_eq!(rotated.refresh.as_deref(), Some("r2"));

        let access_only: TokenResponse = serde_json::from_str(r#"{"access":"a2"}"#).unwrap();
        assert!(access_only.refresh.is_none());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ClientConfig::new("https://shop.example.com/");
        assert_eq!(
            config.endpoint("/api/auth/login/"),
            "https://shop.example.com/api/auth/login/"
        );
        assert_eq!(config.endpoint("api/store/products/"), "https://shop.example.com/api/store/products/");
    }
}
