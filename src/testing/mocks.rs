//! Mock implementations of the auth traits
//!
//! Deterministic in-memory doubles for the credential store and the auth
//! endpoints, used by unit tests and available to downstream test code.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::auth::{
    AuthApi, AuthApiError, CredentialStore, StoreError, TokenPair, TokenResponse,
};

/// In-memory credential store with the same atomicity contract as the
/// keychain-backed one.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    // Mutex poisoning is acceptable in test doubles; a panicking test fails
    // anyway.
    pair: Mutex<Option<TokenPair>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a pair directly, bypassing the async trait surface.
    pub fn seed(&self, pair: TokenPair) {
        *self.pair.lock().unwrap() = Some(pair);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        *self.pair.lock().unwrap() = Some(pair.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenPair>, StoreError> {
        Ok(self.pair.lock().unwrap().clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.pair.lock().unwrap() = None;
        Ok(())
    }
}

type ScriptQueue<T> = Mutex<VecDeque<Result<T, AuthApiError>>>;

#[derive(Default)]
struct MockAuthApiInner {
    login_results: ScriptQueue<TokenResponse>,
    login_calls: AtomicUsize,
    refresh_results: ScriptQueue<TokenResponse>,
    refresh_calls: AtomicUsize,
    refresh_gate: Mutex<Option<Arc<Semaphore>>>,
    verify_results: Mutex<VecDeque<bool>>,
    verify_calls: AtomicUsize,
    verify_code_results: ScriptQueue<TokenResponse>,
    logout_calls: AtomicUsize,
    register_calls: AtomicUsize,
}

/// Scriptable auth endpoint double with per-endpoint call counters.
///
/// Clones share state, so a test can keep a handle for assertions while the
/// coordinator owns another.
#[derive(Clone, Default)]
pub struct MockAuthApi {
    inner: Arc<MockAuthApiInner>,
}

impl MockAuthApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_login_ok(&self, access: &str, refresh: &str) {
        self.inner.login_results.lock().unwrap().push_back(Ok(TokenResponse {
            access: access.to_string(),
            refresh: Some(refresh.to_string()),
        }));
    }

    pub fn script_login_err(&self, err: AuthApiError) {
        self.inner.login_results.lock().unwrap().push_back(Err(err));
    }

    /// Queue a successful refresh exchange; `refresh: None` means the server
    /// did not rotate the refresh token.
    pub fn script_refresh_ok(&self, access: &str, refresh: Option<&str>) {
        self.inner.refresh_results.lock().unwrap().push_back(Ok(TokenResponse {
            access: access.to_string(),
            refresh: refresh.map(str::to_string),
        }));
    }

    pub fn script_refresh_expired(&self) {
        self.inner.refresh_results.lock().unwrap().push_back(Err(AuthApiError::ExpiredRefresh));
    }

    pub fn script_refresh_network_failure(&self) {
        self.inner
            .refresh_results
            .lock()
            .unwrap()
            .push_back(Err(AuthApiError::Network("connection reset".to_string())));
    }

    /// Make `refresh_token` block until permits are added to the returned
    /// semaphore, so tests can pile up concurrent waiters deterministically.
    #[must_use]
    pub fn hold_refresh(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.inner.refresh_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn script_verify(&self, accepted: bool) {
        self.inner.verify_results.lock().unwrap().push_back(accepted);
    }

    pub fn script_verify_code_ok(&self, access: &str, refresh: &str) {
        self.inner.verify_code_results.lock().unwrap().push_back(Ok(TokenResponse {
            access: access.to_string(),
            refresh: Some(refresh.to_string()),
        }));
    }

    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.inner.login_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn verify_calls(&self) -> usize {
        self.inner.verify_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn logout_calls(&self) -> usize {
        self.inner.logout_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn register_calls(&self) -> usize {
        self.inner.register_calls.load(Ordering::SeqCst)
    }

    fn pop<T>(queue: &ScriptQueue<T>, endpoint: &str) -> Result<T, AuthApiError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AuthApiError::Network(format!("no scripted {endpoint} response"))))
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _email: &str, _password: &str) -> Result<TokenResponse, AuthApiError> {
        self.inner.login_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.inner.login_results, "login")
    }

    async fn refresh_token(&self, _refresh: &str) -> Result<TokenResponse, AuthApiError> {
        self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.inner.refresh_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.map_err(|_| {
                AuthApiError::Network("refresh gate closed".to_string())
            })?.forget();
        }
        Self::pop(&self.inner.refresh_results, "refresh")
    }

    async fn verify_token(&self, _access: &str) -> Result<bool, AuthApiError> {
        self.inner.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.verify_results.lock().unwrap().pop_front().unwrap_or(false))
    }

    async fn logout(&self, _refresh: &str) -> Result<(), AuthApiError> {
        self.inner.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn register(&self, _email: &str, _password: &str) -> Result<(), AuthApiError> {
        self.inner.register_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn verify_code(&self, _email: &str, _code: &str) -> Result<TokenResponse, AuthApiError> {
        Self::pop(&self.inner.verify_code_results, "verify-code")
    }
}
