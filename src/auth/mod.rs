//! Credential lifecycle for the storefront backend
//!
//! This module owns the authenticated session end to end:
//!
//! ```text
//! ┌──────────────┐
//! │ AuthService  │  login / logout / register flows
//! └──────┬───────┘
//!        ├──► AuthClient          (HTTP auth endpoints, refresh exchange)
//!        ├──► RefreshCoordinator  (single-flight 401 recovery)
//!        │          │
//!        │          └──► CredentialStore  (durable token pair)
//!        └──► SessionTracker      (observable auth status)
//! ```
//!
//! The request pipeline in [`crate::api`] reads credentials through
//! [`CredentialStore`] and recovers from 401s through [`RefreshCoordinator`];
//! everything else in the application only sees [`AuthService`] and the
//! session status channel.

pub mod client;
pub mod coordinator;
pub mod service;
pub mod session;
pub mod store;
pub mod traits;
pub mod types;

pub use client::{AuthApiError, AuthClient};
pub use coordinator::RefreshCoordinator;
pub use service::{AuthService, AuthServiceError};
pub use session::SessionTracker;
pub use store::{KeyringCredentialStore, StoreError};
pub use traits::{AuthApi, CredentialStore};
pub use types::{ClientConfig, SessionStatus, TokenPair, TokenResponse};
