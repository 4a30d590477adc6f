//! Single-flight refresh coordination
//!
//! The coordinator is the state machine between the request pipeline and the
//! refresh executor. When requests fail with 401 concurrently, exactly one of
//! them leads a *refresh episode*; the rest attach as followers and await the
//! shared outcome. The episode's exchange runs on a spawned task, so a caller
//! timing out or being cancelled can never strand the followers.
//!
//! States:
//! - `Idle`: no refresh in flight
//! - `Refreshing`: one episode in flight; its outcome channel is shared by
//!   every waiter
//! - `Failed`: the last episode failed; terminal until the next successful
//!   login resets the machine

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::session::SessionTracker;
use super::traits::{AuthApi, CredentialStore};
use super::types::{SessionStatus, TokenPair};
use crate::api::errors::ApiError;

/// Resolution of a refresh episode, broadcast to every waiter.
#[derive(Debug, Clone)]
enum EpisodeOutcome {
    /// The store now holds the new pair; retry with this access token
    Refreshed { access: String },
    /// The refresh was rejected; the session is over
    Expired,
}

type OutcomeRx = watch::Receiver<Option<EpisodeOutcome>>;

enum State {
    Idle,
    Refreshing { outcome: OutcomeRx },
    Failed,
}

/// De-duplicates concurrent refresh attempts and drives the single retry.
pub struct RefreshCoordinator {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn CredentialStore>,
    session: SessionTracker,
    // Sole mutual-exclusion point: every state transition and every
    // coordinator-driven store write happens under this lock.
    state: Arc<Mutex<State>>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn CredentialStore>,
        session: SessionTracker,
    ) -> Self {
        Self { api, store, session, state: Arc::new(Mutex::new(State::Idle)) }
    }

    /// Called by the pipeline after a 401 on a request that has not been
    /// retried yet. Resolves to a fresh access token to retry with, or
    /// [`ApiError::AuthExpired`] when the session cannot be recovered.
    ///
    /// `stale_access` is the token the failing request was dispatched with
    /// (`None` when it went out unauthenticated). If the store already holds
    /// a different token, a sibling's episode has resolved in the meantime
    /// and the request retries with that token without a new exchange.
    ///
    /// # Errors
    /// Returns `AuthExpired` when the refresh fails or the machine is in
    /// `Failed`, `Store` when the credential store is unreadable
    pub async fn refresh_after_unauthorized(
        &self,
        stale_access: Option<&str>,
    ) -> Result<String, ApiError> {
        let rx = {
            let mut state = self.state.lock().await;
            match &*state {
                State::Failed => return Err(ApiError::AuthExpired),
                State::Refreshing { outcome } => {
                    debug!("attaching to in-flight refresh episode");
                    outcome.clone()
                }
                State::Idle => {
                    let current =
                        self.store.load().await.map_err(|e| ApiError::Store(e.to_string()))?;

                    if let Some(pair) = &current {
                        if stale_access != Some(pair.access.as_str()) {
                            debug!("credential already rotated, retrying without refresh");
                            return Ok(pair.access.clone());
                        }
                    }

                    let refresh = match current {
                        Some(pair) => pair.refresh,
                        None => {
                            // Nothing to exchange.
                            *state = State::Failed;
                            self.session.set(SessionStatus::Unauthenticated);
                            return Err(ApiError::AuthExpired);
                        }
                    };

                    info!("starting refresh episode");
                    let (tx, rx) = watch::channel(None);
                    *state = State::Refreshing { outcome: rx.clone() };
                    self.spawn_episode(refresh, tx);
                    rx
                }
            }
        };

        self.await_outcome(rx).await
    }

    /// Reset `Failed -> Idle` after an external successful login has
    /// repopulated the credential store.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = State::Idle;
    }

    /// Logout-time teardown. Lets any in-flight episode finish, then clears
    /// the store again and parks the machine in `Failed`, so a late episode
    /// completion cannot resurrect a logged-out session.
    pub async fn invalidate(&self) {
        let pending = {
            let state = self.state.lock().await;
            match &*state {
                State::Refreshing { outcome } => Some(outcome.clone()),
                _ => None,
            }
        };

        if let Some(mut rx) = pending {
            debug!("waiting for in-flight refresh episode before invalidating");
            while rx.borrow().is_none() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }

        let mut state = self.state.lock().await;
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear credential store during invalidation");
        }
        *state = State::Failed;
        self.session.set(SessionStatus::Unauthenticated);
    }

    /// Run the exchange on its own task and resolve the episode. Resolution
    /// happens under the state lock: store and session are only touched while
    /// the machine is still `Refreshing`, so a login or logout that resolved
    /// the machine in the meantime can never have its decision overwritten by
    /// a late exchange. The store is updated (or cleared) *before* the
    /// outcome is published, so no waiter can observe a stale pair.
    fn spawn_episode(&self, refresh: String, tx: watch::Sender<Option<EpisodeOutcome>>) {
        let api = Arc::clone(&self.api);
        let store = Arc::clone(&self.store);
        let session = self.session.clone();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let exchange = api.refresh_token(&refresh).await;

            let outcome = {
                let mut state = state.lock().await;
                if !matches!(&*state, State::Refreshing { .. }) {
                    // A login or logout resolved the machine while the
                    // exchange was in flight; its decision wins and this
                    // episode's result is discarded. Waiters retry with
                    // whatever the winner left in the store.
                    debug!("refresh episode superseded, discarding result");
                    let outcome = match store.load().await {
                        Ok(Some(pair)) => EpisodeOutcome::Refreshed { access: pair.access },
                        _ => EpisodeOutcome::Expired,
                    };
                    drop(state);
                    let _ = tx.send(Some(outcome));
                    return;
                }

                match exchange {
                    Ok(tokens) => {
                        // Keep the old refresh token unless the server
                        // rotated it.
                        let pair = TokenPair {
                            access: tokens.access,
                            refresh: tokens.refresh.unwrap_or(refresh),
                        };
                        match store.save(&pair).await {
                            Ok(()) => {
                                info!("access credential refreshed");
                                session.set(SessionStatus::Authenticated);
                                *state = State::Idle;
                                EpisodeOutcome::Refreshed { access: pair.access }
                            }
                            Err(err) => {
                                error!(error = %err, "failed to persist refreshed credentials");
                                let _ = store.clear().await;
                                session.set(SessionStatus::Unauthenticated);
                                *state = State::Failed;
                                EpisodeOutcome::Expired
                            }
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "refresh exchange failed, ending session");
                        let _ = store.clear().await;
                        session.set(SessionStatus::Unauthenticated);
                        *state = State::Failed;
                        EpisodeOutcome::Expired
                    }
                }
            };

            // Release leader and followers only after the state settled.
            let _ = tx.send(Some(outcome));
        });
    }

    async fn await_outcome(&self, mut rx: OutcomeRx) -> Result<String, ApiError> {
        loop {
            let resolved = rx.borrow().clone();
            if let Some(outcome) = resolved {
                return match outcome {
                    EpisodeOutcome::Refreshed { access } => Ok(access),
                    EpisodeOutcome::Expired => Err(ApiError::AuthExpired),
                };
            }
            if rx.changed().await.is_err() {
                // The episode task died without resolving. Should be
                // unreachable; fail safe by dropping the credentials.
                let _ = self.store.clear().await;
                self.session.set(SessionStatus::Unauthenticated);
                return Err(ApiError::Concurrency(
                    "refresh episode dropped without resolving".to_string(),
                ));
            }
        }
    }
}
