use anyhow::Result;

use super::error::LoadError;
use super::statement::{InsertStatement, StatementError};
use super::summary::LoadSummary;
use crate::db::{Connection, TableSchema};
use crate::formats::Record;

/// Inserts records one at a time into a single table
pub struct Loader<'a> {
    table: &'a str,
    schema: &'a TableSchema,
    ignore_errors: bool,
}

impl<'a> Loader<'a> {
    pub fn new(table: &'a str, schema: &'a TableSchema, ignore_errors: bool) -> Self {
        Self {
            table,
            schema,
            ignore_errors,
        }
    }

    /// Insert every record in order
    ///
    /// A failed row aborts the load with that row's error unless errors are
    /// ignored, in which case it is recorded in the summary and the next
    /// record is processed.
    pub async fn run(&self, conn: &mut Connection, records: Vec<Record>) -> Result<LoadSummary> {
        let mut summary = LoadSummary::new(self.table);

        for (row, record) in records.into_iter().enumerate() {
            match self.load_record(conn, row, record).await {
                Err(err) if !self.ignore_errors => {
                    tracing::error!(row = err.row(), "row failed, aborting load");
                    return Err(err.into());
                }
                Err(err) => {
                    tracing::warn!(row = err.row(), error = %err, "row failed, continuing");
                    summary.update(Err(err));
                }
                outcome => summary.update(outcome),
            }
        }

        tracing::info!(
            table = self.table,
            records = summary.records_processed,
            rows_inserted = summary.rows_inserted,
            failed = summary.errors.len(),
            "load finished"
        );

        Ok(summary)
    }

    /// Build and execute the INSERT for one record, returning affected rows
    async fn load_record(
        &self,
        conn: &mut Connection,
        row: usize,
        record: Record,
    ) -> Result<u64, LoadError> {
        let statement =
            InsertStatement::build(self.table, record, self.schema).map_err(|e| match e {
                StatementError::Convert { field, source } => LoadError::Convert {
                    row,
                    field,
                    error: source,
                },
                StatementError::NoKnownColumns { table } => LoadError::NoColumns { row, table },
            })?;

        tracing::debug!(
            row,
            columns = statement.columns().len(),
            sql = statement.sql(),
            "executing insert"
        );

        match conn.execute(&statement).await {
            Ok(rows_affected) => Ok(rows_affected),
            Err(error) => {
                let (statement, params) = statement.into_parts();
                Err(LoadError::Insert {
                    row,
                    error,
                    statement,
                    params,
                })
            }
        }
    }
}
