//! Schema definition for delimited datasets.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarrierError, Result};
use crate::schema::column::{ColumnDefinition, ColumnType};

/// A schema defines the structure of rows in a dataset.
///
/// Columns are ordered: the loader maps delimited fields to columns by
/// position, and that order is preserved through the feature pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered column definitions.
    columns: Vec<ColumnDefinition>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Schema {
            columns: Vec::new(),
        }
    }

    /// Load a schema from a JSON definition file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let schema: Schema = serde_json::from_str(&data)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Add a column to the schema.
    pub fn add_column<S: Into<String>>(&mut self, name: S, column_type: ColumnType) -> Result<()> {
        let name = name.into();

        if name.is_empty() {
            return Err(HarrierError::schema("column name cannot be empty"));
        }

        if self.has_column(&name) {
            return Err(HarrierError::schema(format!(
                "column '{name}' already exists"
            )));
        }

        self.columns.push(ColumnDefinition::new(name, column_type));
        Ok(())
    }

    /// Get a column definition by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Get all column definitions in declared order.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Get all column names in declared order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Validate the schema: at least one column, no empty or duplicate names.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(HarrierError::schema("schema must have at least one column"));
        }

        for (i, column) in self.columns.iter().enumerate() {
            if column.name.is_empty() {
                return Err(HarrierError::schema("column name cannot be empty"));
            }

            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(HarrierError::schema(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }

        Ok(())
    }

    /// Create a builder for constructing schemas.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// A builder for constructing schemas in a fluent manner.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new schema builder.
    pub fn new() -> Self {
        SchemaBuilder {
            schema: Schema::new(),
        }
    }

    /// Add a text column.
    pub fn text<S: Into<String>>(self, name: S) -> Result<Self> {
        self.add_column(name, ColumnType::Text)
    }

    /// Add an integer column.
    pub fn integer<S: Into<String>>(self, name: S) -> Result<Self> {
        self.add_column(name, ColumnType::Integer)
    }

    /// Add a float column.
    pub fn float<S: Into<String>>(self, name: S) -> Result<Self> {
        self.add_column(name, ColumnType::Float)
    }

    /// Add a boolean column.
    pub fn boolean<S: Into<String>>(self, name: S) -> Result<Self> {
        self.add_column(name, ColumnType::Boolean)
    }

    /// Add a column of any type.
    pub fn add_column<S: Into<String>>(mut self, name: S, column_type: ColumnType) -> Result<Self> {
        self.schema.add_column(name, column_type)?;
        Ok(self)
    }

    /// Build the final schema.
    pub fn build(self) -> Result<Schema> {
        self.schema.validate()?;
        Ok(self.schema)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
