//! Database layer - connection and schema catalog lookup

pub mod connection;
pub mod schema;

pub use connection::{ConnectArgs, Connection, connect};
pub use schema::{TableSchema, query_table_schema};
