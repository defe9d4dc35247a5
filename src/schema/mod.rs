//! Schema management for dataset structure definition.

pub mod column;
pub mod schema;

pub use column::{ColumnDefinition, ColumnType};
pub use schema::{Schema, SchemaBuilder};
