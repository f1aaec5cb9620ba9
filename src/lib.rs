//! gbq-gateway
//!
//! A thin, typed delegation layer for running queries against Google BigQuery
//! and writing polars DataFrames to BigQuery tables. All authentication,
//! pagination, batching and wire-protocol logic lives in the delegated client
//! (enabled via the `bigquery` feature); this crate only resolves a client
//! handle on first use and forwards request parameters unchanged.
//!
//! Module organization:
//! - `gateway`: the facade, request types, delegated-client trait and errors
//! - `config`: crate-level configuration (default project id, from env)

pub mod config;
pub mod gateway;

pub use config::GatewayConfig;
pub use gateway::client::{ClientHandle, DelegatedClient};
pub use gateway::error::{GatewayError, Result};
pub use gateway::facade::Gateway;
pub use gateway::request::{AuthParams, QueryRequest, WriteRequest};

/// The tabular exchange format for query results and write inputs.
pub use polars::prelude::DataFrame;
