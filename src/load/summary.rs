use std::io::{self, Write};

use super::error::LoadError;

/// Totals and tolerated failures of a completed load
#[derive(Debug)]
pub struct LoadSummary {
    pub table: String,
    pub records_processed: usize,
    /// Sum of affected-row counts, not of records
    pub rows_inserted: u64,
    pub errors: Vec<LoadError>,
}

impl LoadSummary {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            records_processed: 0,
            rows_inserted: 0,
            errors: Vec::new(),
        }
    }

    /// Record the outcome of one row
    pub fn update(&mut self, outcome: Result<u64, LoadError>) {
        self.records_processed += 1;
        match outcome {
            Ok(rows_affected) => self.rows_inserted += rows_affected,
            Err(err) => self.errors.push(err),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Process exit status: 1 if any row failed, even when tolerated
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() { 1 } else { 0 }
    }

    /// Write the totals line and the enumerated error listing
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Inserted {} rows into {}", self.rows_inserted, self.table)?;

        if self.has_errors() {
            writeln!(
                out,
                "Errors occurred during execution ({}):",
                self.errors.len()
            )?;
            for (i, err) in self.errors.iter().enumerate() {
                writeln!(out, "#{}\n{}\n", i, err)?;
            }
        }

        Ok(())
    }
}
