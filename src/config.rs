//! Gateway configuration
//!
//! Crate-level settings shared by every request that goes through a
//! [`Gateway`](crate::Gateway). Per-request values (project id, auth
//! parameters) always take precedence over what is configured here.

use crate::gateway::error::{GatewayError, Result};

/// Crate-level gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Default account/project identifier, used when a request carries none
    pub project_id: Option<String>,
}

impl GatewayConfig {
    /// Create a config with a default project id
    pub fn new(project_id: impl Into<String>) -> Self {
        GatewayConfig {
            project_id: Some(project_id.into()),
        }
    }

    /// Create a config from environment variables
    ///
    /// Reads `GBQ_PROJECT_ID`, falling back to `GOOGLE_CLOUD_PROJECT`.
    /// Fails if neither is set; use `GatewayConfig::default()` when requests
    /// carry their own project id.
    pub fn from_env() -> Result<Self> {
        let project_id = std::env::var("GBQ_PROJECT_ID")
            .or_else(|_| std::env::var("GOOGLE_CLOUD_PROJECT"))
            .map_err(|_| {
                GatewayError::Config(
                    "neither GBQ_PROJECT_ID nor GOOGLE_CLOUD_PROJECT environment variable is set"
                        .into(),
                )
            })?;

        Ok(GatewayConfig {
            project_id: Some(project_id),
        })
    }
}
