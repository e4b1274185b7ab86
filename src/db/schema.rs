use anyhow::{Context, Result, bail};
use std::collections::HashMap;

use super::connection::Connection;

/// A column of the destination table, as reported by the schema catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type, e.g. `timestamp without time zone` or `jsonb`
    pub data_type: String,
    /// Qualified catalog type name that bound text is cast to, when the
    /// backend needs one
    pub cast_type: Option<String>,
}

/// Columns of the destination table, keyed by name
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    columns: HashMap<String, ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(columns: impl IntoIterator<Item = ColumnDescriptor>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|col| (col.name.clone(), col))
                .collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.get(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Table name as given on the command line, split into optional schema and name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub schema: Option<&'a str>,
    pub name: &'a str,
}

impl<'a> TableRef<'a> {
    pub fn parse(table: &'a str) -> Self {
        match table.split_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => Self {
                schema: Some(schema),
                name,
            },
            _ => Self {
                schema: None,
                name: table,
            },
        }
    }
}

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Query the columns of the target table from the schema catalog
pub async fn query_table_schema(
    conn: &mut Connection,
    database: &str,
    table: &str,
) -> Result<TableSchema> {
    let table_ref = TableRef::parse(table);

    let columns = conn
        .fetch_columns(database, &table_ref)
        .await
        .context("Failed to read table structure")?;

    if columns.is_empty() {
        bail!("Table '{}' not found or has no columns", table);
    }

    Ok(TableSchema::new(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection as _;

    fn column(name: &str, data_type: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type: data_type.to_string(),
            cast_type: None,
        }
    }

    #[test]
    fn test_table_ref_parse() {
        assert_eq!(
            TableRef::parse("events"),
            TableRef {
                schema: None,
                name: "events"
            }
        );
        assert_eq!(
            TableRef::parse("audit.events"),
            TableRef {
                schema: Some("audit"),
                name: "events"
            }
        );
        assert_eq!(
            TableRef::parse(".events"),
            TableRef {
                schema: None,
                name: ".events"
            }
        );
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("id"), "\"id\"");
        assert_eq!(quote_identifier("Mixed Case"), "\"Mixed Case\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_table_schema_lookup() {
        let schema = TableSchema::new(vec![column("id", "integer"), column("meta", "jsonb")]);

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.column("meta").unwrap().data_type, "jsonb");
        assert!(schema.column("missing").is_none());
        assert!(TableSchema::default().is_empty());
    }

    #[tokio::test]
    async fn test_query_table_schema_sqlite() {
        let mut sqlite = sqlx::SqliteConnection::connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE events (id INTEGER, created_at TIMESTAMP, payload JSONB)")
            .execute(&mut sqlite)
            .await
            .unwrap();
        let mut conn = Connection::Sqlite(sqlite);

        let schema = query_table_schema(&mut conn, "main", "events")
            .await
            .unwrap();

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.column("created_at").unwrap().data_type, "TIMESTAMP");
        assert_eq!(schema.column("payload").unwrap().data_type, "JSONB");
        assert_eq!(schema.column("id").unwrap().cast_type, None);
    }

    #[tokio::test]
    async fn test_query_table_schema_missing_table() {
        let sqlite = sqlx::SqliteConnection::connect("sqlite::memory:")
            .await
            .unwrap();
        let mut conn = Connection::Sqlite(sqlite);

        let err = query_table_schema(&mut conn, "main", "nope")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
