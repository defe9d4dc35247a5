//! Typed in-memory datasets and the delimited-text loader.

pub mod loader;
pub mod row;
pub mod value;

pub use loader::{DatasetReader, LoadOptions};
pub use row::{Dataset, Row};
pub use value::Value;
