//! The single database connection a load runs on.
use anyhow::{Context, Result};
use derive_builder::Builder;
use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgConnection};

use super::schema::{ColumnDescriptor, TableRef, quote_identifier};
use crate::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER};
use crate::load::statement::InsertStatement;

/// Column names, declared types and catalog types of one table.
/// `$3` narrows the lookup to a schema when the table name is qualified.
const COLUMNS_SQL: &str = r#"
    SELECT
        column_name::text,
        data_type::text,
        udt_schema::text,
        udt_name::text
    FROM information_schema.columns
    WHERE table_name = $1
    AND table_catalog = $2
    AND ($3::text IS NULL OR table_schema = $3)
    ORDER BY ordinal_position
"#;

/// Connection parameters
#[derive(Debug, Clone, Builder)]
pub struct ConnectArgs {
    #[builder(setter(into), default = "DEFAULT_HOST.to_string()")]
    pub host: String,
    #[builder(default = "DEFAULT_PORT")]
    pub port: u16,
    #[builder(setter(into), default = "DEFAULT_USER.to_string()")]
    pub username: String,
    #[builder(setter(into), default)]
    pub password: String,
    #[builder(setter(into))]
    pub database: String,
}

/// Connection that can be either Postgres or SQLite
#[derive(Debug)]
pub enum Connection {
    Postgres(PgConnection),
    #[cfg(test)]
    Sqlite(sqlx::SqliteConnection),
}

/// Open a Postgres connection
///
/// An empty password leaves the driver's own fallbacks (`PGPASSWORD`,
/// `.pgpass`) in effect.
pub async fn connect(args: &ConnectArgs) -> Result<Connection> {
    let mut connect_options = PgConnectOptions::new()
        .host(&args.host)
        .port(args.port)
        .username(&args.username)
        .database(&args.database);
    if !args.password.is_empty() {
        connect_options = connect_options.password(&args.password);
    }

    let conn = connect_options.connect().await.with_context(|| {
        format!(
            "Failed to connect to db {}@{}:{}/{}",
            args.username, args.host, args.port, args.database
        )
    })?;

    tracing::info!(
        host = %args.host,
        port = args.port,
        database = %args.database,
        "connected"
    );

    Ok(Connection::Postgres(conn))
}

impl Connection {
    /// Fetch the column descriptors of a table from the schema catalog
    pub async fn fetch_columns(
        &mut self,
        database: &str,
        table: &TableRef<'_>,
    ) -> Result<Vec<ColumnDescriptor>, sqlx::Error> {
        match self {
            Connection::Postgres(conn) => {
                let rows: Vec<(String, String, String, String)> = sqlx::query_as(COLUMNS_SQL)
                    .bind(table.name)
                    .bind(database)
                    .bind(table.schema)
                    .fetch_all(&mut *conn)
                    .await?;

                Ok(rows
                    .into_iter()
                    .map(|(name, data_type, udt_schema, udt_name)| ColumnDescriptor {
                        name,
                        data_type,
                        cast_type: Some(format!(
                            "{}.{}",
                            quote_identifier(&udt_schema),
                            quote_identifier(&udt_name)
                        )),
                    })
                    .collect())
            }
            #[cfg(test)]
            Connection::Sqlite(conn) => {
                // SQLite has no catalog database; the table's own pragma is enough
                let rows: Vec<(String, String)> =
                    sqlx::query_as("SELECT name, type FROM pragma_table_info(?)")
                        .bind(table.name)
                        .fetch_all(&mut *conn)
                        .await?;

                Ok(rows
                    .into_iter()
                    .map(|(name, data_type)| ColumnDescriptor {
                        name,
                        data_type,
                        cast_type: None,
                    })
                    .collect())
            }
        }
    }

    /// Execute an INSERT statement, returning the number of affected rows
    pub async fn execute(&mut self, statement: &InsertStatement) -> Result<u64, sqlx::Error> {
        match self {
            Connection::Postgres(conn) => {
                let mut query = sqlx::query(statement.sql());
                for value in text_params(statement) {
                    query = query.bind(value);
                }
                let result = query.execute(&mut *conn).await?;
                Ok(result.rows_affected())
            }
            #[cfg(test)]
            Connection::Sqlite(conn) => {
                let sqlite_sql = convert_to_sqlite_placeholders(statement.sql());
                let mut query = sqlx::query(&sqlite_sql);
                for value in statement.params() {
                    query = bind_sqlite_value(query, value);
                }
                let result = query.execute(&mut *conn).await?;
                Ok(result.rows_affected())
            }
        }
    }

    /// Close the connection gracefully
    pub async fn close(self) -> Result<(), sqlx::Error> {
        match self {
            Connection::Postgres(conn) => sqlx::Connection::close(conn).await,
            #[cfg(test)]
            Connection::Sqlite(conn) => sqlx::Connection::close(conn).await,
        }
    }
}

/// Parameters as Postgres receives them
///
/// Every value goes over as text (or NULL); the statement casts each
/// placeholder to its column's type.
fn text_params(statement: &InsertStatement) -> Vec<Option<String>> {
    statement.params().iter().map(|value| value.to_text()).collect()
}

/// Bind a value with its native SQLite type
#[cfg(test)]
fn bind_sqlite_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &crate::load::value::SqlValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    use crate::load::value::SqlValue;

    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        SqlValue::Timestamp(ts) => query.bind(*ts),
        SqlValue::Text(_) | SqlValue::Json(_) | SqlValue::Array(_) => query.bind(value.to_text()),
    }
}

/// Convert Postgres-style placeholders ($1, $2, ...) to SQLite-style (?, ?, ...)
#[cfg(test)]
fn convert_to_sqlite_placeholders(sql: &str) -> String {
    let mut result = String::new();
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            // Skip the dollar sign and any following digits
            while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                chars.next();
            }
            result.push('?');
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_args_defaults() {
        let args = ConnectArgsBuilder::default()
            .database("warehouse")
            .build()
            .unwrap();

        assert_eq!(args.host, "localhost");
        assert_eq!(args.port, 5432);
        assert_eq!(args.username, "root");
        assert_eq!(args.password, "");
        assert_eq!(args.database, "warehouse");
    }

    #[test]
    fn test_connect_args_require_database() {
        assert!(ConnectArgsBuilder::default().host("db").build().is_err());
    }

    #[test]
    fn test_convert_to_sqlite_placeholders() {
        assert_eq!(
            convert_to_sqlite_placeholders(r#"INSERT INTO t ("a","b") VALUES ($1,$2)"#),
            r#"INSERT INTO t ("a","b") VALUES (?,?)"#
        );
        assert_eq!(
            convert_to_sqlite_placeholders("VALUES ($10,$11)"),
            "VALUES (?,?)"
        );
    }

    #[test]
    fn test_text_params_for_cast_placeholders() {
        use crate::db::schema::{ColumnDescriptor, TableSchema};
        use serde_json::json;

        let column = |name: &str, data_type: &str, udt: &str| ColumnDescriptor {
            name: name.to_string(),
            data_type: data_type.to_string(),
            cast_type: Some(format!("\"pg_catalog\".\"{}\"", udt)),
        };
        let schema = TableSchema::new(vec![
            column("id", "integer", "int4"),
            column("n", "bigint", "int8"),
            column("ts", "timestamp without time zone", "timestamp"),
            column("meta", "jsonb", "jsonb"),
            column("note", "text", "text"),
        ]);
        let record = json!({
            "id": 1.0,
            "n": 1e3,
            "ts": 1609459200,
            "meta": {"a": 1},
            "note": null
        });
        let serde_json::Value::Object(record) = record else {
            panic!("not an object");
        };

        let statement = InsertStatement::build("t", record, &schema).unwrap();

        assert!(statement.sql().contains("CAST($1 AS \"pg_catalog\".\"int4\")"));
        assert!(statement.sql().contains("CAST($2 AS \"pg_catalog\".\"int8\")"));
        assert_eq!(
            text_params(&statement),
            vec![
                Some("1".to_string()),
                Some("1000".to_string()),
                Some("2021-01-01T00:00:00+00:00".to_string()),
                Some(r#"{"a":1}"#.to_string()),
                None,
            ]
        );
    }

    #[tokio::test]
    async fn test_sqlite_connection_closes() {
        use sqlx::Connection as _;

        let sqlite = sqlx::SqliteConnection::connect("sqlite::memory:")
            .await
            .unwrap();
        let conn = Connection::Sqlite(sqlite);

        conn.close().await.unwrap();
    }
}
