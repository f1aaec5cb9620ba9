use thiserror::Error;

/// Name of the package providing the delegated BigQuery client
pub const DELEGATED_PACKAGE: &str = "gcp-bigquery-client";

/// Errors that can occur when going through the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No delegated client could be resolved; carries a remediation message
    #[error("{0}")]
    DependencyMissing(String),

    /// Any failure raised by the delegated client, propagated unchanged
    #[error(transparent)]
    Delegated(Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error (missing env vars, missing project id, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Build the canonical missing-dependency error
    ///
    /// The message names the delegated package and gives both install-command
    /// forms so a caller hitting this at runtime knows exactly what to do.
    pub fn dependency_missing() -> Self {
        GatewayError::DependencyMissing(format!(
            "Query and write data with Google BigQuery\n\
             \n\
             this build of gbq-gateway has no delegated client: the `bigquery`\n\
             feature, which pulls in the {DELEGATED_PACKAGE} package, is disabled\n\
             \n\
             you can enable it via cargo add or Cargo.toml:\n\
             cargo add gbq-gateway --features bigquery\n\
             gbq-gateway = {{ version = \"0.1\", features = [\"bigquery\"] }}\n"
        ))
    }

    /// Wrap a delegated-client failure without translating it
    pub fn delegated<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GatewayError::Delegated(Box::new(err))
    }
}

/// Type alias for Results using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;
