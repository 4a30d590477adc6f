//! Top-level wiring for the storefront client.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::{
    AuthApi, AuthClient, AuthService, ClientConfig, CredentialStore, KeyringCredentialStore,
    RefreshCoordinator, SessionTracker,
};

const KEYCHAIN_SERVICE: &str = "storefront-client";

/// Fully wired client: the authenticated request pipeline plus the auth
/// flows, sharing one credential store, refresh coordinator, and session
/// tracker.
pub struct StorefrontClient {
    api: ApiClient,
    auth: AuthService,
    session: SessionTracker,
}

impl StorefrontClient {
    /// Wire a client against the given backend, storing credentials in the
    /// platform keychain.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP clients cannot be constructed
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        Self::builder(config).build()
    }

    /// Start a builder to swap the store or the auth endpoint implementation
    /// (e.g. mocks in tests).
    #[must_use]
    pub fn builder(config: ClientConfig) -> StorefrontClientBuilder {
        StorefrontClientBuilder { config, store: None, auth_api: None }
    }

    /// The authenticated request pipeline.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Login/logout/registration flows and session observation.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// The shared session tracker.
    #[must_use]
    pub fn session(&self) -> &SessionTracker {
        &self.session
    }
}

/// Builder for [`StorefrontClient`].
pub struct StorefrontClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn CredentialStore>>,
    auth_api: Option<Arc<dyn AuthApi>>,
}

impl StorefrontClientBuilder {
    /// Replace the credential store (defaults to the platform keychain).
    #[must_use]
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the auth endpoint client (defaults to [`AuthClient`]).
    #[must_use]
    pub fn auth_api(mut self, api: Arc<dyn AuthApi>) -> Self {
        self.auth_api = Some(api);
        self
    }

    /// # Errors
    /// Returns error if the underlying HTTP clients cannot be constructed
    pub fn build(self) -> Result<StorefrontClient, reqwest::Error> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(KeyringCredentialStore::new(KEYCHAIN_SERVICE)));
        let auth_api: Arc<dyn AuthApi> = match self.auth_api {
            Some(api) => api,
            None => Arc::new(AuthClient::new(self.config.clone())?),
        };
        let session = SessionTracker::new();

        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&auth_api),
            Arc::clone(&store),
            session.clone(),
        ));

        let api = ApiClient::new(self.config, Arc::clone(&store), Arc::clone(&coordinator))?;
        let auth = AuthService::new(auth_api, store, coordinator, session.clone());

        Ok(StorefrontClient { api, auth, session })
    }
}
