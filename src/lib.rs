//! Client SDK for the storefront backend.
//!
//! The crate's core is the authenticated session: it attaches bearer
//! credentials to outbound calls, detects expiry from 401 responses, refreshes
//! the credentials **exactly once per expiry episode** no matter how many
//! requests fail concurrently, and replays each failed request at most once.
//! When the refresh itself fails, the stored credentials are cleared and the
//! observable session status flips to unauthenticated.
//!
//! # Usage
//!
//! ```no_run
//! use storefront_client::{ClientConfig, StorefrontClient};
//!
//! # #[derive(serde::Deserialize)] struct Product;
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StorefrontClient::new(ClientConfig::new("https://shop.example.com"))?;
//!
//!     // Restore a previous session, if any.
//!     client.auth().initialize().await?;
//!
//!     client.auth().login("user@example.com", "hunter2").await?;
//!
//!     // 401s are recovered transparently; a terminal failure surfaces as
//!     // ApiError::AuthExpired.
//!     let products: Vec<Product> = client.api().get("api/store/products/").await?;
//!
//!     client.auth().logout().await;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod api;
pub mod auth;
pub mod client;
pub mod testing;

pub use api::{ApiClient, ApiError, ApiResponse};
pub use auth::{
    AuthApi, AuthApiError, AuthClient, AuthService, AuthServiceError, ClientConfig,
    CredentialStore, KeyringCredentialStore, RefreshCoordinator, SessionStatus, SessionTracker,
    StoreError, TokenPair, TokenResponse,
};
pub use client::{StorefrontClient, StorefrontClientBuilder};
