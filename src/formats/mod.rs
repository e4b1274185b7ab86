//! Input file decoding

pub mod json;

pub use json::{Record, read_records};
