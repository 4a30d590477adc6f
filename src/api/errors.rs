//! Error taxonomy for authenticated API calls.

use thiserror::Error;

use crate::auth::StoreError;

/// Errors surfaced by [`crate::api::ApiClient`].
///
/// Auth-failure detection and the single retry are resolved inside the
/// client; anything that still comes out carries its final classification.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure; untouched by this crate, the caller's own retry
    /// policy applies
    #[error("network error: {0}")]
    Network(String),

    /// The session could not be recovered: the refresh failed, or the single
    /// retry was already spent. The UI maps this to a re-login prompt.
    #[error("session expired")]
    AuthExpired,

    /// Non-auth 4xx/5xx from the backend, passed through unchanged
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// The credential store could not be read or written
    #[error("credential store error: {0}")]
    Store(String),

    /// An internal invariant was violated (e.g. a refresh episode resolved
    /// twice). Unreachable by construction; when observed, the credential
    /// store has already been cleared.
    #[error("refresh coordination fault: {0}")]
    Concurrency(String),
}

impl ApiError {
    /// Whether this error ends the session (the caller should re-login).
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_expired_is_terminal() {
        assert!(ApiError::AuthExpired.is_auth_expired());
        assert!(!ApiError::Network("reset".to_string()).is_auth_expired());
        assert!(!ApiError::Server { status: 500, body: String::new() }.is_auth_expired());
    }

    #[test]
    fn server_error_displays_status() {
        let err = ApiError::Server { status: 503, body: "maintenance".to_string() };
        let rendered = err.to_string();
        assert!(rendered.contains("503"));
        assert!(rendered.contains("maintenance"));
    }
}
