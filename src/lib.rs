//! # Harrier
//!
//! A small model harness for Rust: load delimited text datasets, fit
//! feature pipelines, train and evaluate models, and serve predictions.
//!
//! ## Features
//!
//! - Schema-driven, streaming dataset loading
//! - Composable fit/apply feature pipelines (copy, one-hot, concatenate,
//!   bag-of-words text featurization)
//! - Pluggable model backends behind a single trait
//! - Classification and regression evaluation
//! - Single-file, checksummed model artifacts with atomic saves
//! - A concurrent prediction service with an at-most-once artifact load

pub mod analysis;
pub mod backend;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod pipeline;
pub mod schema;
pub mod serve;
pub mod store;
pub mod trainer;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
