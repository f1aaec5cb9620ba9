//! Remote tabular data gateway
//!
//! Structure:
//! - `facade.rs`: the `Gateway` entry point (`query` / `write`)
//! - `request.rs`: typed request structures and defaults
//! - `client.rs`: the `DelegatedClient` trait and client resolution
//! - `error.rs`: error types
//! - `bigquery/`: the production delegated client (feature `bigquery`)

pub mod client;
pub mod error;
pub mod facade;
pub mod request;

#[cfg(feature = "bigquery")]
pub mod bigquery;

// Re-exports for convenience
pub use client::{ClientHandle, DelegatedClient};
pub use error::{GatewayError, Result};
pub use facade::Gateway;
pub use request::{AuthParams, QueryRequest, WriteRequest};
