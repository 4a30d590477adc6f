//! Traits for credential storage and auth endpoint operations
//!
//! These traits enable dependency injection and testing by abstracting the
//! external collaborators (durable credential storage, the auth server).

use async_trait::async_trait;

use super::client::AuthApiError;
use super::store::StoreError;
use super::types::{TokenPair, TokenResponse};

/// Durable storage for the credential pair.
///
/// A thin key-value surface with no business logic. Implementations must keep
/// the pair atomic: after any operation the store holds a complete pair or
/// nothing at all.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist the credential pair, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the backing storage rejects the write
    async fn save(&self, pair: &TokenPair) -> Result<(), StoreError>;

    /// Retrieve the stored pair, or `None` when no credentials are held.
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be read
    async fn load(&self) -> Result<Option<TokenPair>, StoreError>;

    /// Remove any stored credentials. Clearing an empty store is not an error.
    ///
    /// # Errors
    /// Returns error if the backing storage rejects the deletion
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Operations against the storefront auth endpoints.
///
/// Every method is a stateless network call; session state lives with the
/// caller. `refresh_token` is the refresh executor the coordinator drives.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange email + password for a credential pair.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` on a rejected login, `Network` on
    /// transport failure
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, AuthApiError>;

    /// Mint a new access token from a refresh token.
    ///
    /// The response may carry a rotated refresh token.
    ///
    /// # Errors
    /// Returns `ExpiredRefresh` when the refresh token is no longer accepted,
    /// `Network` on transport failure
    async fn refresh_token(&self, refresh: &str) -> Result<TokenResponse, AuthApiError>;

    /// Check whether an access token is currently accepted by the server.
    ///
    /// # Errors
    /// Returns `Network` on transport failure; a rejected token is `Ok(false)`
    async fn verify_token(&self, access: &str) -> Result<bool, AuthApiError>;

    /// Revoke a refresh token server-side.
    ///
    /// # Errors
    /// Returns error if the server rejects the revocation; callers treat this
    /// as best effort
    async fn logout(&self, refresh: &str) -> Result<(), AuthApiError>;

    /// Create an account; the server e-mails a verification code.
    ///
    /// # Errors
    /// Returns `Rejected` with the validation payload on a refused registration
    async fn register(&self, email: &str, password: &str) -> Result<(), AuthApiError>;

    /// Submit the e-mailed verification code; a correct code activates the
    /// account and issues a credential pair.
    ///
    /// # Errors
    /// Returns `Rejected` on a wrong or expired code
    async fn verify_code(&self, email: &str, code: &str) -> Result<TokenResponse, AuthApiError>;
}
