//! Gateway facade
//!
//! Single entry point for callers: resolve-or-reuse the delegated client,
//! forward the request, hand back the delegate's result untouched. No retry,
//! no validation, no transformation lives here.

use polars::prelude::DataFrame;
use tokio::sync::OnceCell;
use tracing::debug;

use super::client::{resolve_client, ClientHandle};
use super::error::Result;
use super::request::{QueryRequest, WriteRequest};
use crate::config::GatewayConfig;

/// Facade over the delegated remote-analytics client
///
/// The client handle is resolved on the first `query` or `write` call and
/// cached for the lifetime of the gateway; the `OnceCell` makes concurrent
/// first calls race safely.
pub struct Gateway {
    config: GatewayConfig,
    client: OnceCell<ClientHandle>,
}

impl Gateway {
    /// Create a gateway with deferred client resolution
    ///
    /// If no delegated client is available, the failure surfaces as
    /// `DependencyMissing` on the first operation rather than here.
    pub fn new(config: GatewayConfig) -> Self {
        Gateway {
            config,
            client: OnceCell::new(),
        }
    }

    /// Create a gateway around an explicitly injected client
    ///
    /// The resolution path is never taken; useful for tests and for callers
    /// that construct their own delegated client.
    pub fn with_client(config: GatewayConfig, client: ClientHandle) -> Self {
        Gateway {
            config,
            client: OnceCell::new_with(Some(client)),
        }
    }

    /// Resolve-or-reuse the delegated client handle
    async fn client(&self) -> Result<&ClientHandle> {
        self.client
            .get_or_try_init(|| async { resolve_client(&self.config) })
            .await
    }

    /// Execute a query and load the results into a frame
    ///
    /// Every field of `request` is forwarded once, unmodified, to the
    /// delegated client; the returned frame is exactly the delegate's frame.
    /// Failures other than `DependencyMissing` are the delegate's own,
    /// propagated unchanged.
    pub async fn query(&self, request: QueryRequest) -> Result<DataFrame> {
        let client = self.client().await?;

        debug!(query = %request.query, dialect = %request.dialect, "forwarding query to delegated client");
        let frame = client.query(&request).await?;
        debug!(rows = frame.height(), columns = frame.width(), "query returned");

        Ok(frame)
    }

    /// Write a frame to a remote table
    ///
    /// The frame and every field of `request` are forwarded once, unmodified.
    /// Success is the absence of an error; existence-policy violations,
    /// schema mismatches and auth failures are the delegate's own.
    pub async fn write(&self, frame: &DataFrame, request: WriteRequest) -> Result<()> {
        let client = self.client().await?;

        debug!(
            destination = %request.destination_table,
            rows = frame.height(),
            chunk_size = request.chunk_size,
            "forwarding write to delegated client"
        );
        client.write(frame, &request).await?;

        Ok(())
    }

    /// The configuration this gateway was built with
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::client::DelegatedClient;
    use crate::gateway::error::GatewayError;
    use async_trait::async_trait;
    use polars::df;
    use std::sync::{Arc, Mutex};

    /// Test double that records every request it receives
    struct RecordingClient {
        queries: Mutex<Vec<QueryRequest>>,
        writes: Mutex<Vec<(DataFrame, WriteRequest)>>,
        result: DataFrame,
    }

    impl RecordingClient {
        fn returning(result: DataFrame) -> Arc<Self> {
            Arc::new(RecordingClient {
                queries: Mutex::new(Vec::new()),
                writes: Mutex::new(Vec::new()),
                result,
            })
        }
    }

    #[async_trait]
    impl DelegatedClient for RecordingClient {
        async fn query(&self, request: &QueryRequest) -> Result<DataFrame> {
            self.queries.lock().unwrap().push(request.clone());
            Ok(self.result.clone())
        }

        async fn write(&self, frame: &DataFrame, request: &WriteRequest) -> Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push((frame.clone(), request.clone()));
            Ok(())
        }
    }

    /// Test double that rejects unknown existence policies, like the real
    /// delegate does
    struct StrictClient;

    #[async_trait]
    impl DelegatedClient for StrictClient {
        async fn query(&self, _request: &QueryRequest) -> Result<DataFrame> {
            Ok(DataFrame::empty())
        }

        async fn write(&self, _frame: &DataFrame, request: &WriteRequest) -> Result<()> {
            match request.if_exists.as_str() {
                "fail" | "replace" | "append" => Ok(()),
                other => Err(GatewayError::delegated(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid if_exists value: {other}"),
                ))),
            }
        }
    }

    fn sample_frame() -> DataFrame {
        df! {
            "name" => ["a", "b", "c"],
            "value" => [1.0, 2.5, 4.0]
        }
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_forwards_every_field_once() {
        let client = RecordingClient::returning(DataFrame::empty());
        let gateway = Gateway::with_client(GatewayConfig::default(), client.clone());

        let request = QueryRequest::new("SELECT name FROM t")
            .project_id("proj")
            .index_col("name")
            .col_order(vec!["name".into()])
            .dialect("standard")
            .verbose(false)
            .configuration("query", serde_json::json!({ "useQueryCache": false }));

        gateway.query(request.clone()).await.unwrap();

        let seen = client.queries.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], request);
    }

    #[tokio::test]
    async fn test_query_returns_the_delegates_frame_unchanged() {
        let frame = sample_frame();
        let client = RecordingClient::returning(frame.clone());
        let gateway = Gateway::with_client(GatewayConfig::default(), client);

        let result = gateway.query(QueryRequest::new("SELECT 1")).await.unwrap();
        assert!(result.equals(&frame));
    }

    #[tokio::test]
    async fn test_write_forwards_frame_and_request() {
        let client = RecordingClient::returning(DataFrame::empty());
        let gateway = Gateway::with_client(GatewayConfig::default(), client.clone());

        let frame = sample_frame();
        let request = WriteRequest::new("dataset.table")
            .project_id("proj")
            .chunk_size(500)
            .if_exists("append");

        gateway.write(&frame, request.clone()).await.unwrap();

        let seen = client.writes.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.equals(&frame));
        assert_eq!(seen[0].1, request);
    }

    #[tokio::test]
    async fn test_invalid_if_exists_surfaces_as_delegated_failure() {
        let gateway = Gateway::with_client(GatewayConfig::default(), Arc::new(StrictClient));

        let err = gateway
            .write(&sample_frame(), WriteRequest::new("d.t").if_exists("upsert"))
            .await
            .err()
            .unwrap();

        match err {
            GatewayError::Delegated(inner) => {
                assert!(inner.to_string().contains("invalid if_exists value: upsert"));
            }
            other => panic!("expected Delegated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_injected_client_is_reused_across_calls() {
        let client = RecordingClient::returning(DataFrame::empty());
        let gateway = Gateway::with_client(GatewayConfig::default(), client.clone());

        gateway.query(QueryRequest::new("SELECT 1")).await.unwrap();
        gateway.query(QueryRequest::new("SELECT 2")).await.unwrap();

        assert_eq!(client.queries.lock().unwrap().len(), 2);
    }

    #[cfg(not(feature = "bigquery"))]
    mod without_delegate {
        use super::*;
        use crate::gateway::error::DELEGATED_PACKAGE;

        fn assert_dependency_missing(err: GatewayError) {
            match err {
                GatewayError::DependencyMissing(message) => {
                    assert!(message.contains(DELEGATED_PACKAGE));
                    assert!(message.contains("cargo add gbq-gateway --features bigquery"));
                    assert!(message.contains("features = [\"bigquery\"]"));
                }
                other => panic!("expected DependencyMissing, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_query_without_client_reports_dependency_missing() {
            let gateway = Gateway::new(GatewayConfig::default());
            let err = gateway
                .query(QueryRequest::new("SELECT 1"))
                .await
                .err()
                .unwrap();
            assert_dependency_missing(err);
        }

        #[tokio::test]
        async fn test_write_without_client_reports_dependency_missing() {
            let gateway = Gateway::new(GatewayConfig::default());
            let err = gateway
                .write(&DataFrame::empty(), WriteRequest::new("d.t"))
                .await
                .err()
                .unwrap();
            assert_dependency_missing(err);
        }
    }
}
