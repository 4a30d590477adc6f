//! Authenticated request pipeline
//!
//! Each outbound call is a value threaded through explicit stages:
//! attach-credential, dispatch, classify-response, maybe-refresh-and-retry.
//! The retry flag stays local to the pipeline, so a request can be
//! redispatched at most once due to an auth failure, no matter how the
//! refresh episode resolves.

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::errors::ApiError;
use crate::auth::{ClientConfig, CredentialStore, RefreshCoordinator};

/// A completed non-error response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Deserialize the body.
    ///
    /// # Errors
    /// Returns `ApiError::Server` when the body does not match `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Server {
            status: self.status,
            body: format!("unparseable response body: {e}"),
        })
    }
}

/// HTTP client for the storefront API with managed bearer credentials.
///
/// Attaches the current access token to every request, classifies responses,
/// and on a 401 asks the [`RefreshCoordinator`] for a fresh token before
/// redispatching the request exactly once.
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Create a client over the given store and refresh coordinator.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be constructed
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config, store, coordinator })
    }

    /// Issue an authenticated request.
    ///
    /// # Errors
    /// - `ApiError::Network` on transport failure
    /// - `ApiError::AuthExpired` when the session cannot be recovered
    /// - `ApiError::Server` for any other non-success status
    #[instrument(skip(self, body), fields(%method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse, ApiError> {
        // Attach-credential stage: read whatever the store currently holds.
        // Absent credentials dispatch unauthenticated and let the server
        // decide.
        let mut bearer = self.store.load().await?.map(|pair| pair.access);
        let mut retried = false;

        loop {
            let response = self.dispatch(&method, path, body.as_ref(), bearer.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Self::classify(response).await;
            }
            if retried {
                // The single retry is spent; a server that still rejects the
                // refreshed token ends the session for this caller.
                debug!(path, "still unauthorized after retry");
                return Err(ApiError::AuthExpired);
            }

            debug!(path, "unauthorized, requesting credential refresh");
            let fresh = self.coordinator.refresh_after_unauthorized(bearer.as_deref()).await?;
            bearer = Some(fresh);
            retried = true;
        }
    }

    /// GET a JSON resource.
    ///
    /// # Errors
    /// See [`ApiClient::request`]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await?.json()
    }

    /// POST a JSON body and deserialize the JSON response.
    ///
    /// # Errors
    /// See [`ApiClient::request`]
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Network(format!("request body serialization failed: {e}")))?;
        self.request(Method::POST, path, Some(body)).await?.json()
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.config.endpoint(path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn classify(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Network(e.to_string()))?;
        if status.is_success() {
            Ok(ApiResponse { status: status.as_u16(), body })
        } else {
            Err(ApiError::Server { status: status.as_u16(), body })
        }
    }
}
