use crate::db::schema::{TableSchema, quote_identifier};
use crate::formats::Record;

use super::value::{ConversionError, SqlValue, convert_value};

/// Why a record could not be turned into an INSERT
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    /// A field whose value could not be converted for its column
    #[error("field {field}: {source}")]
    Convert {
        field: String,
        #[source]
        source: ConversionError,
    },
    #[error("record has no columns of table {table}")]
    NoKnownColumns { table: String },
}

/// A parameterized INSERT for one record
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    sql: String,
    columns: Vec<String>,
    params: Vec<SqlValue>,
}

impl InsertStatement {
    /// Build the INSERT for one record
    ///
    /// Keys the table does not have are dropped. Kept keys get placeholders
    /// `$1..$n` in the order the record visits them. A record with no kept
    /// keys is an error.
    pub fn build(
        table: &str,
        record: Record,
        schema: &TableSchema,
    ) -> Result<Self, StatementError> {
        let mut columns = Vec::with_capacity(record.len());
        let mut placeholders = Vec::with_capacity(record.len());
        let mut params = Vec::with_capacity(record.len());

        for (key, value) in record {
            let Some(column) = schema.column(&key) else {
                tracing::debug!(field = %key, "dropping field not present in table");
                continue;
            };

            let value = convert_value(value, &column.data_type).map_err(|source| {
                StatementError::Convert {
                    field: key.clone(),
                    source,
                }
            })?;

            let placeholder = format!("${}", params.len() + 1);
            placeholders.push(match &column.cast_type {
                Some(cast_type) => format!("CAST({} AS {})", placeholder, cast_type),
                None => placeholder,
            });
            columns.push(quote_identifier(&key));
            params.push(value);
        }

        if columns.is_empty() {
            return Err(StatementError::NoKnownColumns {
                table: table.to_string(),
            });
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(","),
            placeholders.join(",")
        );

        Ok(Self {
            sql,
            columns,
            params,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Quoted column names, in placeholder order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}
