//! Durable credential storage over the platform keychain.
//!
//! The backing stores (macOS Keychain, Windows Credential Manager, Linux
//! Secret Service via the `keyring` crate) are only atomic per key, so the
//! whole pair is serialized as one JSON document under a single entry. That
//! makes the pair invariant (complete or absent, never half-written) hold
//! for free.

use async_trait::async_trait;
use keyring::Entry;
use thiserror::Error;
use tracing::debug;

use super::traits::CredentialStore;
use super::types::TokenPair;

const DEFAULT_ACCOUNT: &str = "session";

/// Error type for credential store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage failed
    #[error("credential storage failed: {0}")]
    Backend(String),

    /// The stored payload could not be (de)serialized
    #[error("credential payload malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Credential store backed by the platform keychain.
///
/// Keychain calls are blocking, so they run on the tokio blocking pool.
pub struct KeyringCredentialStore {
    service: String,
    account: String,
}

impl KeyringCredentialStore {
    /// Create a store under the given keychain service name.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into(), account: DEFAULT_ACCOUNT.to_string() }
    }

    /// Use a non-default account name, e.g. to keep several profiles apart.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    async fn with_entry<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Entry) -> Result<T, keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let account = self.account.clone();
        let result = tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &account)?;
            op(&entry)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("keychain task failed: {e}")))?;
        result.map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        let payload = serde_json::to_string(pair)?;
        self.with_entry(move |entry| entry.set_password(&payload)).await?;
        debug!(service = %self.service, "credential pair stored");
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenPair>, StoreError> {
        let payload = self
            .with_entry(|entry| match entry.get_password() {
                Ok(payload) => Ok(Some(payload)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(other) => Err(other),
            })
            .await?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.with_entry(|entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(other) => Err(other),
        })
        .await?;
        debug!(service = %self.service, "credential pair cleared");
        Ok(())
    }
}
