//! Authenticated request pipeline for the storefront API.

pub mod client;
pub mod errors;

pub use client::{ApiClient, ApiResponse};
pub use errors::ApiError;
