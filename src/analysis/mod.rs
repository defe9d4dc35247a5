//! Text analysis for feature extraction.
//!
//! Tokenization is the deterministic text capability behind the
//! `TextFeaturize` pipeline step: the same text tokenized with the same
//! tokenizer always yields the same token sequence.

pub mod tokenizer;

pub use tokenizer::{Tokenizer, WordTokenizer};
