use super::value::{ConversionError, SqlValue};

/// A failure loading one record
///
/// The cause is part of the message rather than a chained source, so the
/// report and a fatal `anyhow` chain print it once.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A value could not be converted; the row was not executed
    #[error("Failed to convert field {field} of row #{row}: {error}")]
    Convert {
        row: usize,
        field: String,
        error: ConversionError,
    },
    /// None of the record's keys name a column; the row was not executed
    #[error("Failed to insert row #{row}: record has no columns of table {table}")]
    NoColumns { row: usize, table: String },
    #[error(
        "Failed to insert row #{row}: {error}\n\nquery: {statement}\n\nvals: {}",
        format_params(.params)
    )]
    Insert {
        row: usize,
        error: sqlx::Error,
        statement: String,
        params: Vec<SqlValue>,
    },
}

impl LoadError {
    /// Zero-based index of the record in the input array
    pub fn row(&self) -> usize {
        match self {
            LoadError::Convert { row, .. }
            | LoadError::NoColumns { row, .. }
            | LoadError::Insert { row, .. } => *row,
        }
    }
}

fn format_params(params: &[SqlValue]) -> String {
    let rendered: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}
