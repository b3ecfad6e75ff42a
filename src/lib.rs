// Main library entry point for Stepwise.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

use domain::complexity::Complexity;
use domain::trace::{Step, TraceLimits};
use infrastructure::ScriptParser;

/// Synthesize the trace of `source` with default limits.
pub fn synthesize_trace(source: &str, inputs: &[String]) -> Vec<Step> {
    application::synthesize_trace(&ScriptParser, source, inputs, TraceLimits::default())
}

/// Estimate the time complexity of `source` from its loop nesting.
pub fn estimate_complexity(source: &str) -> Complexity {
    application::estimate_complexity(&ScriptParser, source)
}
