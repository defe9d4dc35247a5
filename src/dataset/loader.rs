//! Delimited-text dataset loading.
//!
//! [`DatasetReader`] is a streaming, finite, non-restartable iterator of
//! rows; [`Dataset::load`] materializes one, which fit-time pipeline steps
//! (vocabulary learning) require.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::dataset::row::{Dataset, Row};
use crate::dataset::value::Value;
use crate::error::{HarrierError, Result};
use crate::schema::{ColumnType, Schema};

/// Options controlling how delimited text is read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter.
    pub delimiter: char,
    /// Whether the first line is a header row to skip.
    pub has_header: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: '\t',
            has_header: false,
        }
    }
}

impl LoadOptions {
    /// Tab-separated, no header (the sentiment dataset shape).
    pub fn tsv() -> Self {
        LoadOptions::default()
    }

    /// Comma-separated with a header row (the taxi-fare dataset shape).
    pub fn csv_with_header() -> Self {
        LoadOptions {
            delimiter: ',',
            has_header: true,
        }
    }
}

/// A streaming reader producing one typed [`Row`] per input line.
///
/// Lines are validated against the schema as they are read: a field-count
/// mismatch is a `MalformedRow` error and an unconvertible field is a
/// `TypeCoercion` error, both carrying the 1-based line number.
pub struct DatasetReader<R: BufRead> {
    reader: R,
    schema: Schema,
    options: LoadOptions,
    /// Source label used in error messages (file path or `<memory>`).
    source: String,
    line: usize,
    header_skipped: bool,
}

impl DatasetReader<BufReader<File>> {
    /// Open a delimited text file for streaming reads.
    pub fn open<P: AsRef<Path>>(path: P, schema: &Schema, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(DatasetReader::new(
            BufReader::new(file),
            schema,
            options,
            path.display().to_string(),
        ))
    }
}

impl<R: BufRead> DatasetReader<R> {
    /// Create a reader over any buffered source.
    pub fn new(reader: R, schema: &Schema, options: LoadOptions, source: String) -> Self {
        DatasetReader {
            reader,
            schema: schema.clone(),
            options,
            source,
            line: 0,
            header_skipped: false,
        }
    }

    fn parse_line(&self, line: &str) -> Result<Row> {
        let fields: Vec<&str> = line.split(self.options.delimiter).collect();

        if fields.len() != self.schema.len() {
            return Err(HarrierError::malformed_row(
                &self.source,
                self.line,
                self.schema.len(),
                fields.len(),
            ));
        }

        let mut row = Row::new();
        for (column, field) in self.schema.columns().iter().zip(fields) {
            let value = coerce(field, column.column_type).ok_or_else(|| {
                HarrierError::type_coercion(&column.name, field, self.line, column.column_type.name())
            })?;
            row.set(column.name.clone(), value);
        }

        Ok(row)
    }
}

impl<R: BufRead> Iterator for DatasetReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = String::new();
            match self.reader.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line += 1;

            let line = buf.trim_end_matches(['\n', '\r']);

            if self.options.has_header && !self.header_skipped {
                self.header_skipped = true;
                continue;
            }

            // Skip blank lines rather than reporting a field-count mismatch.
            if line.is_empty() {
                continue;
            }

            return Some(self.parse_line(line));
        }
    }
}

/// Convert one raw field to its declared type.
///
/// Also used by the prediction service to coerce query-string inputs
/// against the stored schema.
pub fn coerce(field: &str, column_type: ColumnType) -> Option<Value> {
    match column_type {
        ColumnType::Text => Some(Value::Text(field.to_string())),
        ColumnType::Integer => field.trim().parse::<i64>().ok().map(Value::Integer),
        ColumnType::Float => field.trim().parse::<f64>().ok().map(Value::Float),
        ColumnType::Boolean => match field.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(Value::Boolean(true)),
            "false" | "f" | "0" => Some(Value::Boolean(false)),
            _ => None,
        },
    }
}

impl Dataset {
    /// Load and fully materialize a delimited text file.
    pub fn load<P: AsRef<Path>>(path: P, schema: &Schema, options: LoadOptions) -> Result<Self> {
        schema.validate()?;
        let reader = DatasetReader::open(path, schema, options)?;
        let rows = reader.collect::<Result<Vec<_>>>()?;
        Ok(Dataset::from_rows(schema.clone(), rows))
    }

    /// Materialize rows from any buffered source (used by tests and the CLI
    /// for stdin input).
    pub fn read_from<R: BufRead>(reader: R, schema: &Schema, options: LoadOptions) -> Result<Self> {
        schema.validate()?;
        let reader = DatasetReader::new(reader, schema, options, "<memory>".to_string());
        let rows = reader.collect::<Result<Vec<_>>>()?;
        Ok(Dataset::from_rows(schema.clone(), rows))
    }
}
