//! Typed request structures
//!
//! Every field is forwarded verbatim to the delegated client; the gateway
//! performs no validation or transformation. Defaults: legacy SQL dialect,
//! verbose output, 10k-row write chunks, fail-on-existing-table.

use std::collections::HashMap;
use std::path::PathBuf;

/// Default number of rows per insert chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Authentication parameters, shared by query and write requests
///
/// How these are honored is entirely up to the delegated client. The
/// BigQuery delegate resolves them in order: `private_key` (service account,
/// file path or inline JSON), then the local-webserver OAuth flow, then
/// application default credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthParams {
    /// Force reauthentication instead of reusing cached credentials
    pub reauth: bool,

    /// Service account private key in JSON format; file path or inline contents
    pub private_key: Option<String>,

    /// Use the local-webserver OAuth flow instead of default credentials
    pub auth_local_webserver: bool,

    /// Override for the path where user credentials are cached
    pub credentials_path: Option<PathBuf>,
}

impl AuthParams {
    /// Service account authentication from key material (path or contents)
    pub fn with_private_key(key: impl Into<String>) -> Self {
        AuthParams {
            private_key: Some(key.into()),
            ..Default::default()
        }
    }
}

/// A query to execute against the remote analytics service
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// SQL-like query text
    pub query: String,

    /// Account/project identifier; falls back to the gateway config default
    pub project_id: Option<String>,

    /// Name of the result column to move to the front of the frame
    pub index_col: Option<String>,

    /// Desired result column order
    pub col_order: Option<Vec<String>>,

    /// SQL dialect, "legacy" or "standard"; forwarded, not validated here
    pub dialect: String,

    /// Verbose progress output from the delegated client
    pub verbose: bool,

    /// Authentication parameters
    pub auth: AuthParams,

    /// Open-ended job configuration forwarded verbatim to the delegated
    /// client, e.g. `{"query": {"useQueryCache": false}}`
    pub configuration: HashMap<String, serde_json::Value>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        QueryRequest {
            query: query.into(),
            project_id: None,
            index_col: None,
            col_order: None,
            dialect: "legacy".to_string(),
            verbose: true,
            auth: AuthParams::default(),
            configuration: HashMap::new(),
        }
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn index_col(mut self, index_col: impl Into<String>) -> Self {
        self.index_col = Some(index_col.into());
        self
    }

    pub fn col_order(mut self, col_order: Vec<String>) -> Self {
        self.col_order = Some(col_order);
        self
    }

    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn auth(mut self, auth: AuthParams) -> Self {
        self.auth = auth;
        self
    }

    /// Add one configuration section to the escape-hatch map
    pub fn configuration(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.configuration.insert(key.into(), value);
        self
    }
}

/// A request to write a frame to a remote table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// Destination table in `dataset.table` form
    pub destination_table: String,

    /// Account/project identifier; falls back to the gateway config default
    pub project_id: Option<String>,

    /// Number of rows per insert chunk; honored by the delegated client
    pub chunk_size: usize,

    /// Existence policy: "fail", "replace" or "append"; forwarded, not
    /// validated here - an unknown value is the delegated client's failure
    pub if_exists: String,

    /// Verbose progress output from the delegated client
    pub verbose: bool,

    /// Authentication parameters
    pub auth: AuthParams,
}

impl WriteRequest {
    pub fn new(destination_table: impl Into<String>) -> Self {
        WriteRequest {
            destination_table: destination_table.into(),
            project_id: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            if_exists: "fail".to_string(),
            verbose: true,
            auth: AuthParams::default(),
        }
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn if_exists(mut self, if_exists: impl Into<String>) -> Self {
        self.if_exists = if_exists.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn auth(mut self, auth: AuthParams) -> Self {
        self.auth = auth;
        self
    }
}
