//! High-level runner API for the JSON loader.
//!
//! This module provides the public interface that wraps connecting, decoding
//! the input file, reading the table structure and running the row loop.
//!
//! This is the primary API for external users and for the CLI.

use anyhow::Result;
use std::path::PathBuf;

use crate::db::{self, query_table_schema};
use crate::formats::read_records;
use crate::load::Loader;

pub use crate::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER};
pub use crate::db::connection::{ConnectArgs, ConnectArgsBuilder, ConnectArgsBuilderError};
pub use crate::load::{LoadError, LoadSummary};

/// Arguments for running a load
#[derive(Debug)]
pub struct LoadArgs {
    pub connection: ConnectArgs,

    /// Destination table, optionally schema-qualified (`schema.table`)
    pub table: String,
    /// Path to a JSON file holding an array of objects
    pub input_path: PathBuf,

    /// Record per-row failures and keep going instead of aborting
    pub ignore_errors: bool,

    // Test-only: inject a pre-opened connection (for SQLite testing)
    #[cfg(test)]
    pub test_connection: Option<db::Connection>,
}

/// Load every record of the input file into the target table
///
/// Fatal conditions (connection, input file, empty input, schema lookup, or
/// any row failure when errors are not ignored) return `Err`. Tolerated row
/// failures are returned in the summary.
///
/// # Example
///
/// ```no_run
/// use json2pg::runner::{ConnectArgsBuilder, LoadArgs, run_load};
///
/// # async fn example() -> anyhow::Result<()> {
/// let args = LoadArgs {
///     connection: ConnectArgsBuilder::default()
///         .host("localhost")
///         .database("warehouse")
///         .build()?,
///     table: "events".to_string(),
///     input_path: "events.json".into(),
///     ignore_errors: true,
/// };
///
/// let summary = run_load(args).await?;
/// println!("Inserted {} rows", summary.rows_inserted);
/// # Ok(())
/// # }
/// ```
pub async fn run_load(args: LoadArgs) -> Result<LoadSummary> {
    #[cfg(test)]
    let mut conn = match args.test_connection {
        Some(conn) => conn,
        None => db::connect(&args.connection).await?,
    };

    #[cfg(not(test))]
    let mut conn = db::connect(&args.connection).await?;

    let records = read_records(&args.input_path).await?;
    tracing::info!(
        path = %args.input_path.display(),
        records = records.len(),
        "decoded input file"
    );

    let schema = query_table_schema(&mut conn, &args.connection.database, &args.table).await?;
    tracing::info!(table = %args.table, columns = schema.len(), "read table structure");

    let summary = Loader::new(&args.table, &schema, args.ignore_errors)
        .run(&mut conn, records)
        .await?;

    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "failed to close connection cleanly");
    }

    Ok(summary)
}
