//! gbq - command-line front end for the gateway
//!
//! Runs a query and prints the resulting frame, or loads a CSV and writes it
//! to a BigQuery table. Project id comes from `--project-id` or the
//! `GBQ_PROJECT_ID` / `GOOGLE_CLOUD_PROJECT` environment variables.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use polars::prelude::*;

use gbq_gateway::{Gateway, GatewayConfig, QueryRequest, WriteRequest};

#[derive(Parser)]
#[command(name = "gbq", version, about = "Query and write BigQuery tables")]
struct Cli {
    /// BigQuery project id; falls back to the environment
    #[arg(long, global = true)]
    project_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a query and print the result
    Query {
        /// SQL query text
        sql: String,

        /// SQL dialect: "legacy" or "standard"
        #[arg(long, default_value = "legacy")]
        dialect: String,
    },
    /// Load a CSV file and write it to a table
    Write {
        /// Path to the CSV file
        path: PathBuf,

        /// Destination table in dataset.table form
        destination: String,

        /// Existence policy: fail, replace or append
        #[arg(long, default_value = "fail")]
        if_exists: String,

        /// Rows per insert chunk
        #[arg(long, default_value_t = 10_000)]
        chunk_size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.project_id {
        Some(project_id) => GatewayConfig::new(project_id.clone()),
        None => GatewayConfig::from_env().unwrap_or_default(),
    };
    let gateway = Gateway::new(config);

    match cli.command {
        Command::Query { sql, dialect } => {
            let frame = gateway
                .query(QueryRequest::new(sql).dialect(dialect))
                .await?;
            println!("{frame}");
        }
        Command::Write {
            path,
            destination,
            if_exists,
            chunk_size,
        } => {
            let frame = CsvReadOptions::default()
                .try_into_reader_with_file_path(Some(path.clone()))
                .with_context(|| format!("failed to open {}", path.display()))?
                .finish()
                .with_context(|| format!("failed to parse {}", path.display()))?;

            let request = WriteRequest::new(destination.clone())
                .if_exists(if_exists)
                .chunk_size(chunk_size);
            gateway.write(&frame, request).await?;
            println!("wrote {} rows to {destination}", frame.height());
        }
    }

    Ok(())
}
