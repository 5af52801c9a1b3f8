//! Domain modules for the gridexpr computed-column engine.
//!
//! - [`table`] - table schemas and read-only column batches
//! - [`formula`] - the expression language: parser, type resolver,
//!   function catalog, evaluator, and the batch compile API

pub mod formula;
pub mod table;
