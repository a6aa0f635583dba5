//! Log processing for levelwatch
//!
//! This crate provides line classification, per-level aggregation and the
//! echo/summary report formats.

mod aggregator;
mod error;
mod parser;
mod report;
mod source;

pub use aggregator::{LevelAggregator, RunOutcome, StreamEnd, DEFAULT_SUMMARY_INTERVAL};
pub use error::{ClassifyError, TallyError};
pub use parser::LogParser;
pub use report::{format_echo, format_summary, should_summarize};
pub use source::lossy_lines;

// Re-export types used in our public API
pub use levelwatch_types::{LevelCounts, LogLevel, LogLine};
