//! BigQuery delegated client
//!
//! Production implementation of [`DelegatedClient`] on top of the
//! `gcp-bigquery-client` crate. Everything the gateway forwards is honored
//! here: credential resolution, dialect selection, the configuration
//! escape hatch, column ordering, existence policies and chunked inserts.

mod convert;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gcp_bigquery_client::client_builder::ClientBuilder;
use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::model::query_request::QueryRequest as BqQueryRequest;
use gcp_bigquery_client::model::table::Table;
use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;
use gcp_bigquery_client::yup_oauth2::parse_service_account_key;
use gcp_bigquery_client::Client;
use polars::prelude::DataFrame;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::client::DelegatedClient;
use super::error::{GatewayError, Result};
use super::request::{AuthParams, QueryRequest, WriteRequest};
use crate::config::GatewayConfig;

/// Env var pointing at the OAuth client secret used by the local-webserver flow
const OAUTH_CLIENT_SECRET_VAR: &str = "GBQ_OAUTH_CLIENT_SECRET";

/// Failures defined by this delegate rather than the vendor library
///
/// From the facade's point of view these are still delegated failures; the
/// gateway surfaces them unchanged.
#[derive(Debug, Error)]
pub enum BigQueryDelegateError {
    #[error("no project id: set one on the request or the gateway config")]
    MissingProjectId,

    #[error("invalid destination table '{0}': expected 'dataset.table'")]
    InvalidDestinationTable(String),

    #[error("table '{0}' already exists; pass if_exists \"replace\" or \"append\"")]
    TableExists(String),

    #[error("invalid if_exists value '{0}': expected 'fail', 'replace' or 'append'")]
    InvalidIfExists(String),

    #[error("column '{0}' named in col_order is not part of the result")]
    InvalidColumnOrder(String),

    #[error("column '{0}' named in index_col is not part of the result")]
    InvalidIndexColumn(String),

    #[error("unsupported configuration section '{0}': only 'query' is recognized")]
    UnsupportedConfiguration(String),

    #[error("the local-webserver flow requires GBQ_OAUTH_CLIENT_SECRET to point at an OAuth client secret file")]
    MissingClientSecret,

    #[error("failed to read OAuth client secret: {0}")]
    ClientSecretUnreadable(std::io::Error),

    #[error("{0} row(s) failed to insert; first error: {1}")]
    RowInsertErrors(usize, String),
}

impl From<BigQueryDelegateError> for GatewayError {
    fn from(err: BigQueryDelegateError) -> Self {
        GatewayError::delegated(err)
    }
}

fn delegated(err: BQError) -> GatewayError {
    GatewayError::delegated(err)
}

/// Delegated client backed by Google BigQuery
///
/// The vendor client is built lazily on first use and reused afterwards;
/// `AuthParams::reauth` forces a rebuild with fresh credentials.
pub struct BigQueryDelegate {
    config: GatewayConfig,
    vendor: Mutex<Option<Client>>,
}

impl BigQueryDelegate {
    pub fn new(config: GatewayConfig) -> Self {
        BigQueryDelegate {
            config,
            vendor: Mutex::new(None),
        }
    }

    /// Build-or-reuse the vendor client according to the request's auth params
    async fn vendor_client(&self, auth: &AuthParams) -> Result<Client> {
        let mut guard = self.vendor.lock().await;
        if guard.is_none() || auth.reauth {
            debug!(reauth = auth.reauth, "building vendor BigQuery client");
            *guard = Some(build_vendor_client(auth).await?);
        }
        // the vendor client is cheaply cloneable (shared connection pool)
        Ok(guard.as_ref().cloned().unwrap())
    }

    /// Request project id, falling back to the gateway config default
    fn effective_project(&self, request_project: Option<&str>) -> Result<String> {
        request_project
            .map(str::to_string)
            .or_else(|| self.config.project_id.clone())
            .ok_or_else(|| BigQueryDelegateError::MissingProjectId.into())
    }
}

#[async_trait]
impl DelegatedClient for BigQueryDelegate {
    async fn query(&self, request: &QueryRequest) -> Result<DataFrame> {
        let project = self.effective_project(request.project_id.as_deref())?;
        let client = self.vendor_client(&request.auth).await?;
        let bq_request = build_query_request(request)?;

        if request.verbose {
            info!(project = %project, "running BigQuery query job");
        }
        let response = client
            .job()
            .query(&project, bq_request)
            .await
            .map_err(delegated)?;

        let mut frame = convert::result_set_to_frame(response)?;
        if let Some(order) = &request.col_order {
            frame = convert::apply_col_order(frame, order)?;
        }
        if let Some(index_col) = &request.index_col {
            frame = convert::move_index_col_first(frame, index_col)?;
        }

        if request.verbose {
            info!(rows = frame.height(), columns = frame.width(), "query finished");
        }
        Ok(frame)
    }

    async fn write(&self, frame: &DataFrame, request: &WriteRequest) -> Result<()> {
        let project = self.effective_project(request.project_id.as_deref())?;
        let client = self.vendor_client(&request.auth).await?;
        let (dataset, table) = split_destination(&request.destination_table)?;

        let exists = table_exists(&client, &project, dataset, table).await?;
        let create_needed = match request.if_exists.as_str() {
            "fail" => {
                if exists {
                    return Err(BigQueryDelegateError::TableExists(
                        request.destination_table.clone(),
                    )
                    .into());
                }
                true
            }
            "replace" => {
                if exists {
                    client
                        .table()
                        .delete(&project, dataset, table)
                        .await
                        .map_err(delegated)?;
                }
                true
            }
            "append" => !exists,
            other => {
                return Err(BigQueryDelegateError::InvalidIfExists(other.to_string()).into());
            }
        };

        if create_needed {
            let schema = convert::frame_schema(frame);
            client
                .table()
                .create(Table::new(&project, dataset, table, schema))
                .await
                .map_err(delegated)?;
        }

        let rows = convert::frame_to_rows(frame)?;
        let chunk_size = request.chunk_size.max(1);
        let total = rows.len();
        let mut inserted = 0usize;

        for chunk in rows.chunks(chunk_size) {
            let mut insert = TableDataInsertAllRequest::new();
            for row in chunk {
                insert.add_row(None, row.clone()).map_err(delegated)?;
            }
            let response = client
                .tabledata()
                .insert_all(&project, dataset, table, insert)
                .await
                .map_err(delegated)?;

            if let Some(errors) = response.insert_errors {
                if !errors.is_empty() {
                    let first = format!("{:?}", errors[0]);
                    return Err(BigQueryDelegateError::RowInsertErrors(errors.len(), first).into());
                }
            }

            inserted += chunk.len();
            if request.verbose {
                info!(
                    destination = %request.destination_table,
                    done = inserted,
                    total,
                    "inserted chunk"
                );
            }
        }

        Ok(())
    }
}

/// Build the vendor client for the given auth parameters
///
/// Credential resolution order matches the historical gbq behavior:
/// explicit service account key material first, then the local-webserver
/// OAuth flow, then application default credentials.
async fn build_vendor_client(auth: &AuthParams) -> Result<Client> {
    if let Some(key) = &auth.private_key {
        if Path::new(key).is_file() {
            return ClientBuilder::new()
                .build_from_service_account_key_file(key)
                .await
                .map_err(delegated);
        }
        let sa_key = parse_service_account_key(key)
            .map_err(BQError::from)
            .map_err(delegated)?;
        return ClientBuilder::new()
            .build_from_service_account_key(sa_key, false)
            .await
            .map_err(delegated);
    }

    if auth.auth_local_webserver {
        let secret_path = std::env::var(OAUTH_CLIENT_SECRET_VAR)
            .map_err(|_| BigQueryDelegateError::MissingClientSecret)?;
        let secret = std::fs::read(&secret_path)
            .map_err(BigQueryDelegateError::ClientSecretUnreadable)?;
        let persist = auth
            .credentials_path
            .clone()
            .unwrap_or_else(default_credentials_path);
        if auth.reauth {
            // drop the cached token so the flow runs again
            let _ = std::fs::remove_file(&persist);
        }
        return ClientBuilder::new()
            .build_from_installed_flow_authenticator(secret, persist)
            .await
            .map_err(delegated);
    }

    ClientBuilder::new()
        .build_from_application_default_credentials()
        .await
        .map_err(delegated)
}

/// Default location for cached user credentials
fn default_credentials_path() -> PathBuf {
    PathBuf::from("bigquery_credentials.json")
}

/// Translate the typed request into the vendor query request
///
/// The configuration escape hatch only recognizes the `query` section;
/// recognized keys map onto vendor fields, unknown keys are skipped with a
/// warning, unknown sections are a failure.
fn build_query_request(request: &QueryRequest) -> Result<BqQueryRequest> {
    let mut bq_request = BqQueryRequest::new(request.query.clone());
    bq_request.use_legacy_sql = request.dialect != "standard";

    for (section, value) in &request.configuration {
        if section != "query" {
            return Err(BigQueryDelegateError::UnsupportedConfiguration(section.clone()).into());
        }
        let Some(entries) = value.as_object() else {
            continue;
        };
        for (key, entry) in entries {
            match key.as_str() {
                "useQueryCache" => bq_request.use_query_cache = entry.as_bool(),
                "timeoutMs" => bq_request.timeout_ms = entry.as_i64().map(|v| v as i32),
                "maxResults" => bq_request.max_results = entry.as_i64().map(|v| v as i32),
                "dryRun" => bq_request.dry_run = entry.as_bool(),
                other => warn!(key = other, "skipping unsupported query configuration key"),
            }
        }
    }

    Ok(bq_request)
}

/// Split a `dataset.table` destination identifier
fn split_destination(destination: &str) -> Result<(&str, &str)> {
    let mut parts = destination.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(dataset), Some(table), None) if !dataset.is_empty() && !table.is_empty() => {
            Ok((dataset, table))
        }
        _ => Err(BigQueryDelegateError::InvalidDestinationTable(destination.to_string()).into()),
    }
}

/// Existence check; a 404 means "no such table", anything else propagates
async fn table_exists(client: &Client, project: &str, dataset: &str, table: &str) -> Result<bool> {
    let result = client.table().get(project, dataset, table, None).await;
    match result {
        Ok(_) => Ok(true),
        Err(BQError::ResponseError { error }) if error.error.code == 404 => Ok(false),
        Err(e) => Err(delegated(e)),
    }
}
