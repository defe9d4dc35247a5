//! Bag-of-words text featurization.

use serde::{Deserialize, Serialize};

use crate::analysis::{Tokenizer, WordTokenizer};
use crate::dataset::{Dataset, Row, Value};
use crate::error::{HarrierError, Result};

/// Declares featurization of a free-text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFeaturize {
    /// Output vector column.
    pub target: String,
    /// Source text column.
    pub column: String,
}

impl TextFeaturize {
    /// Create a new text featurization step.
    pub fn new<S: Into<String>, T: Into<String>>(target: S, column: T) -> Self {
        TextFeaturize {
            target: target.into(),
            column: column.into(),
        }
    }

    /// Step name used in error messages.
    pub fn name(&self) -> String {
        format!("TextFeaturize({})", self.target)
    }

    /// Scan the training dataset and build the token vocabulary.
    ///
    /// Vocabulary order is first-seen token order, so the fitted vector
    /// layout is deterministic for a given training set.
    pub fn fit(&self, dataset: &Dataset) -> Result<FittedTextFeaturize> {
        if !dataset.has_column(&self.column) {
            return Err(HarrierError::unknown_column(self.name(), &self.column));
        }

        let tokenizer = WordTokenizer::new();
        let mut vocabulary: Vec<String> = Vec::new();

        for (index, row) in dataset.rows().iter().enumerate() {
            let value = row
                .get(&self.column)
                .ok_or_else(|| HarrierError::unknown_column(self.name(), &self.column))?;
            let text = value.as_text().ok_or_else(|| {
                HarrierError::type_coercion(&self.column, value.to_string(), index + 1, "Text")
            })?;

            for token in tokenizer.tokenize(text) {
                if !vocabulary.contains(&token) {
                    vocabulary.push(token);
                }
            }
        }

        Ok(FittedTextFeaturize {
            target: self.target.clone(),
            column: self.column.clone(),
            tokenizer: tokenizer.name().to_string(),
            vocabulary,
        })
    }
}

/// Text featurization with a fitted token vocabulary.
///
/// Apply emits a fixed-cardinality term-frequency vector: element `i` is
/// the number of occurrences of vocabulary token `i` in the input text.
/// Same text + same vocabulary always produces the same vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedTextFeaturize {
    /// Output vector column.
    pub target: String,
    /// Source text column.
    pub column: String,
    /// Name of the tokenizer the vocabulary was built with.
    pub tokenizer: String,
    /// Ordered token vocabulary learned at fit time.
    pub vocabulary: Vec<String>,
}

impl FittedTextFeaturize {
    /// Step name used in error messages.
    pub fn name(&self) -> String {
        format!("TextFeaturize({})", self.target)
    }

    /// The fitted vocabulary, in vector-layout order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Featurize the text column into the target vector column.
    ///
    /// Tokens outside the vocabulary contribute nothing, mirroring the
    /// one-hot policy for unseen categories.
    pub fn apply(&self, mut row: Row) -> Result<Row> {
        let value = row
            .get(&self.column)
            .ok_or_else(|| HarrierError::unknown_column(self.name(), &self.column))?;
        let text = value.as_text().ok_or_else(|| {
            HarrierError::invalid_input(format!(
                "column '{}' holds a {} value, expected Text",
                self.column,
                value.kind()
            ))
        })?;

        let tokenizer = WordTokenizer::new();
        let mut vector = vec![0.0; self.vocabulary.len()];
        for token in tokenizer.tokenize(text) {
            if let Some(position) = self.vocabulary.iter().position(|t| *t == token) {
                vector[position] += 1.0;
            }
        }

        row.set(self.target.clone(), Value::Vector(vector));
        Ok(row)
    }
}
