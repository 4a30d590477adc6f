//! Process-wide session status with push-based change notification.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::types::SessionStatus;

/// Observable authentication status.
///
/// Starts at [`SessionStatus::Unknown`]; the auth service moves it to
/// `Authenticated`/`Unauthenticated` once the stored credentials have been
/// checked, and the refresh coordinator flips it on refresh failure. Cheap to
/// clone; all clones share the same channel.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    tx: Arc<watch::Sender<SessionStatus>>,
}

impl SessionTracker {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionStatus::Unknown);
        Self { tx: Arc::new(tx) }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.tx.borrow()
    }

    /// Subscribe to status changes.
    ///
    /// The receiver sees the current value immediately and every change after.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }

    /// Update the status, notifying subscribers only on an actual change.
    pub fn set(&self, status: SessionStatus) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            debug!(?status, "session status changed");
        }
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}
