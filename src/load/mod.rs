//! Loading records: value conversion, statement building and the row loop

pub mod error;
pub mod statement;
pub mod summary;
pub mod value;
pub mod worker;

pub use error::LoadError;
pub use summary::LoadSummary;
pub use worker::Loader;
