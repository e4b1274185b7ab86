//! Configuration constants for the loader
//!
//! This module centralizes the connection defaults and the column-type
//! markers used throughout the application.

// ============================================================================
// Connection Defaults
// ============================================================================

pub const DEFAULT_USER: &str = "root";

pub const DEFAULT_HOST: &str = "localhost";

pub const DEFAULT_PORT: u16 = 5432;

// ============================================================================
// Value Conversion
// ============================================================================

/// Substring of a declared column type that marks it as a timestamp column
///
/// Matched case-insensitively, so `timestamp without time zone`,
/// `timestamp with time zone` and SQLite's `TIMESTAMP` all qualify.
pub const TIMESTAMP_TYPE_MARKER: &str = "timestamp";
