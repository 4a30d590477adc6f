//! HTTP client for the storefront auth endpoints
//!
//! Covers the full credential surface of the backend:
//! - `login/`: password login, issues a credential pair
//! - `token/refresh/`: mints a new access token (the refresh exchange)
//! - `token/verify/`: checks whether an access token is still accepted
//! - `logout/`: blacklists a refresh token
//! - `register/` + `verify-code/`: two-step e-mail code registration
//!
//! The client is stateless: it holds no tokens and no coordinator state.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::traits::AuthApi;
use super::types::{ClientConfig, TokenResponse};

/// Error type for auth endpoint operations
#[derive(Debug, Error)]
pub enum AuthApiError {
    /// Transport failure; the caller's own retry policy applies
    #[error("network error: {0}")]
    Network(String),

    /// The refresh token was rejected (expired, revoked, or blacklisted)
    #[error("refresh credential expired or revoked")]
    ExpiredRefresh,

    /// Login was refused
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Any other non-success response from an auth endpoint
    #[error("auth endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Error payload shape used by the backend (`{"detail": ...}` or
/// `{"error": ...}` depending on the view).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn message(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail.or(b.error))
            .unwrap_or_else(|| body.to_string())
    }
}

/// The `verify-code/` endpoint nests the issued pair under `tokens`.
#[derive(Debug, Deserialize)]
struct VerifyCodeResponse {
    tokens: TokenResponse,
}

/// HTTP client for the auth endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Client,
    config: ClientConfig,
}

impl AuthClient {
    /// Create a new auth client for the given backend.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be constructed
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<(StatusCode, String), AuthApiError> {
        let url = self.config.endpoint(path);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthApiError::Network(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AuthApiError::Network(e.to_string()))?;
        Ok((status, text))
    }

    fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, AuthApiError> {
        serde_json::from_str(body).map_err(|e| AuthApiError::Rejected {
            status: 200,
            body: format!("unparseable auth response: {e}"),
        })
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, AuthApiError> {
        debug!("logging in");
        let (status, body) = self
            .post_json("api/auth/login/", json!({ "email": email, "password": password }))
            .await?;

        match status {
            s if s.is_success() => Self::parse(&body),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
                Err(AuthApiError::InvalidCredentials(ErrorBody::message(&body)))
            }
            s => Err(AuthApiError::Rejected { status: s.as_u16(), body }),
        }
    }

    async fn refresh_token(&self, refresh: &str) -> Result<TokenResponse, AuthApiError> {
        debug!("exchanging refresh token");
        let (status, body) =
            self.post_json("api/auth/token/refresh/", json!({ "refresh": refresh })).await?;

        match status {
            s if s.is_success() => Self::parse(&body),
            // The token endpoint answers 401 for an expired/blacklisted
            // refresh token and 400 for a malformed one; both are terminal.
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
                Err(AuthApiError::ExpiredRefresh)
            }
            s => Err(AuthApiError::Rejected { status: s.as_u16(), body }),
        }
    }

    async fn verify_token(&self, access: &str) -> Result<bool, AuthApiError> {
        let (status, body) =
            self.post_json("api/auth/token/verify/", json!({ "token": access })).await?;

        match status {
            s if s.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => Ok(false),
            s => Err(AuthApiError::Rejected { status: s.as_u16(), body }),
        }
    }

    async fn logout(&self, refresh: &str) -> Result<(), AuthApiError> {
        debug!("blacklisting refresh token");
        let (status, body) =
            self.post_json("api/auth/logout/", json!({ "refresh": refresh })).await?;

        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            // An already-invalid token is as logged out as it gets.
            Ok(())
        } else {
            Err(AuthApiError::Rejected { status: status.as_u16(), body })
        }
    }

    async fn register(&self, email: &str, password: &str) -> Result<(), AuthApiError> {
        debug!("registering account");
        let (status, body) = self
            .post_json("api/auth/register/", json!({ "email": email, "password": password }))
            .await?;

        if status.is_success() {
            Ok(())
        } else {
            Err(AuthApiError::Rejected { status: status.as_u16(), body })
        }
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<TokenResponse, AuthApiError> {
        debug!("submitting verification code");
        let (status, body) = self
            .post_json("api/auth/verify-code/", json!({ "email": email, "code": code }))
            .await?;

        if status.is_success() {
            let response: VerifyCodeResponse = Self::parse(&body)?;
            Ok(response.tokens)
        } else {
            Err(AuthApiError::Rejected { status: status.as_u16(), body })
        }
    }
}
