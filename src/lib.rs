// Pedantic lint configuration for the crate.
// Most of these are reasonable but too strict for this codebase:
// - cast_possible_truncation: positions and counts stay far below i64/u32 limits
// - cast_precision_loss: Acceptable for progress percentages
// - missing_errors_doc: Error handling is self-evident from Result types
// - missing_panics_doc: Panics are rare and documented inline
// - items_after_statements: Output structs are clearer near their usage
// - unused_async: Required by rmcp's #[tool] macro
// - module_name_repetitions: TrackerError, TrackerServer read better in logs
// - trivially_copy_pass_by_ref: Minor optimization not worth churn
// - needless_pass_by_value: Sometimes clearer semantically
// - single_match_else: match is clearer than if-let for pattern matching
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::items_after_statements,
    clippy::unused_async,
    clippy::module_name_repetitions,
    clippy::trivially_copy_pass_by_ref,
    clippy::needless_pass_by_value,
    clippy::single_match_else
)]

pub mod batch;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod mcp;
pub mod merge;
pub mod models;
pub mod operations;
pub mod store;
pub mod tracker;
