//! Column type and definition types for schemas.

use serde::{Deserialize, Serialize};

/// The declared type of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Free text (sentiment strings, categorical codes, etc.)
    Text,
    /// Signed integer
    Integer,
    /// Floating point
    Float,
    /// Boolean (accepts `true`/`false`, `1`/`0`)
    Boolean,
}

impl ColumnType {
    /// Human-readable name, used in coercion error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Text => "Text",
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::Boolean => "Boolean",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, typed column in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    /// Create a new column definition.
    pub fn new<S: Into<String>>(name: S, column_type: ColumnType) -> Self {
        ColumnDefinition {
            name: name.into(),
            column_type,
        }
    }
}
