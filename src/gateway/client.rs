//! Delegated client trait and resolution
//!
//! The gateway owns no protocol logic; it talks to whatever implements
//! [`DelegatedClient`]. The production implementation lives behind the
//! `bigquery` feature. When that feature is off, resolution fails with a
//! `DependencyMissing` error carrying install instructions.

use std::sync::Arc;

use async_trait::async_trait;
use polars::prelude::DataFrame;

use super::error::Result;
use super::request::{QueryRequest, WriteRequest};
use crate::config::GatewayConfig;

/// The capability the gateway delegates to
///
/// Implementations define all failure semantics: authentication errors,
/// malformed queries, schema conflicts and existence-policy violations all
/// originate here and are surfaced through the gateway unchanged.
#[async_trait]
pub trait DelegatedClient: Send + Sync {
    /// Execute a query and return its results as a frame
    async fn query(&self, request: &QueryRequest) -> Result<DataFrame>;

    /// Write a frame to a remote table
    async fn write(&self, frame: &DataFrame, request: &WriteRequest) -> Result<()>;
}

/// Opaque, shareable handle to a resolved delegated client
pub type ClientHandle = Arc<dyn DelegatedClient>;

/// Resolve the delegated client implementation
///
/// Idempotent and side-effect free; the gateway calls this at most once and
/// caches the handle (see [`Gateway`](super::facade::Gateway)).
#[cfg(feature = "bigquery")]
pub fn resolve_client(config: &GatewayConfig) -> Result<ClientHandle> {
    Ok(Arc::new(super::bigquery::BigQueryDelegate::new(
        config.clone(),
    )))
}

/// Resolve the delegated client implementation
///
/// This build carries no client; report what is missing and how to get it.
#[cfg(not(feature = "bigquery"))]
pub fn resolve_client(_config: &GatewayConfig) -> Result<ClientHandle> {
    Err(super::error::GatewayError::dependency_missing())
}
