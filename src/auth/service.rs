//! High-level auth flow orchestrator
//!
//! Combines the auth endpoints, the credential store, the refresh
//! coordinator, and the session tracker into the login/logout/registration
//! flows the rest of the application calls.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use super::client::AuthApiError;
use super::coordinator::RefreshCoordinator;
use super::session::SessionTracker;
use super::store::StoreError;
use super::traits::{AuthApi, CredentialStore};
use super::types::{SessionStatus, TokenPair, TokenResponse};

/// Error type for auth service operations
#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// An auth endpoint call failed
    #[error("auth endpoint error: {0}")]
    Api(#[from] AuthApiError),

    /// The credential store failed
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// The server issued an access token without a refresh token
    #[error("incomplete token response from server")]
    IncompleteTokens,
}

/// Login, logout, and registration flows, plus session observation.
pub struct AuthService {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    session: SessionTracker,
}

impl AuthService {
    #[must_use]
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
        session: SessionTracker,
    ) -> Self {
        Self { api, store, coordinator, session }
    }

    /// Startup check: look for stored credentials and verify the access token
    /// against the server.
    ///
    /// Returns `true` when the session is authenticated. A failed
    /// verification reports `Unauthenticated` but leaves the stored pair in
    /// place, so the first request can still attempt a refresh.
    ///
    /// # Errors
    /// Returns error if the store is unreadable or the verify call cannot
    /// reach the server; the session stays `Unknown` in the latter case
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<bool, AuthServiceError> {
        let Some(pair) = self.store.load().await? else {
            self.session.set(SessionStatus::Unauthenticated);
            return Ok(false);
        };

        if self.api.verify_token(&pair.access).await? {
            info!("stored credentials verified");
            self.session.set(SessionStatus::Authenticated);
            Ok(true)
        } else {
            self.session.set(SessionStatus::Unauthenticated);
            Ok(false)
        }
    }

    /// Log in with email and password.
    ///
    /// On success the credential store holds the new pair, the refresh
    /// coordinator is reset, and the session reads `Authenticated`.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` on a rejected login
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthServiceError> {
        let tokens = self.api.login(email, password).await?;
        self.install_pair(tokens).await?;
        info!("login completed");
        Ok(())
    }

    /// Create an account. The server e-mails a verification code; follow up
    /// with [`AuthService::verify_registration`].
    ///
    /// # Errors
    /// Returns `Rejected` with the server's validation payload on refusal
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthServiceError> {
        self.api.register(email, password).await?;
        Ok(())
    }

    /// Submit the e-mailed verification code. A correct code activates the
    /// account and logs the session in.
    ///
    /// # Errors
    /// Returns `Rejected` on a wrong or expired code
    #[instrument(skip(self, code))]
    pub async fn verify_registration(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        let tokens = self.api.verify_code(email, code).await?;
        self.install_pair(tokens).await?;
        info!("registration verified");
        Ok(())
    }

    /// Log out. Revokes the refresh token server-side (best effort), waits
    /// out any in-flight refresh episode, and clears the stored credentials.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Ok(Some(pair)) = self.store.load().await {
            if let Err(err) = self.api.logout(&pair.refresh).await {
                warn!(error = %err, "logout request failed, clearing local credentials anyway");
            }
        }
        self.coordinator.invalidate().await;
        info!("logged out");
    }

    /// Current session status.
    #[must_use]
    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Subscribe to session status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.session.subscribe()
    }

    async fn install_pair(&self, tokens: TokenResponse) -> Result<(), AuthServiceError> {
        let refresh = tokens.refresh.ok_or(AuthServiceError::IncompleteTokens)?;
        let pair = TokenPair::new(tokens.access, refresh);
        self.store.save(&pair).await?;
        self.coordinator.reset().await;
        self.session.set(SessionStatus::Authenticated);
        Ok(())
    }
}
