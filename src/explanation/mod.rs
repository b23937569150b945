//! Explanation generation
//!
//! Turns a `GuildScoreResult` into severity-classed feedback naming the
//! shared organisms and conflicting pairs behind each metric.

pub mod formatters;
pub mod fragments;
pub mod generator;
pub mod types;

pub use formatters::MarkdownFormatter;
pub use generator::explain;
pub use types::{Explanation, Severity, MAX_NAMED};
