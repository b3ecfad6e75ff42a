//! Combined result of one analysis request.

use serde::Serialize;

use crate::domain::complexity::Complexity;
use crate::domain::trace::{Step, StepKind};

pub const NO_TRACE: &str = "No trace available.";
pub const TIMED_OUT: &str = "Execution timed out.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Trimmed stdout of the real run.
    pub output: String,
    /// Trimmed stderr of the real run, or the runner failure message.
    pub error: String,
    pub trace: Vec<Step>,
    pub time_complexity: Complexity,
    /// Wall-clock seconds, rounded to 4 decimals.
    pub execution_time: f64,
}

impl AnalysisReport {
    /// An empty trace is reported as a single info step.
    pub fn with_trace(mut self, trace: Vec<Step>) -> Self {
        self.trace = if trace.is_empty() {
            vec![Step::new(StepKind::Info, NO_TRACE)]
        } else {
            trace
        };
        self
    }
}

impl Default for AnalysisReport {
    fn default() -> Self {
        Self {
            output: String::new(),
            error: String::new(),
            trace: vec![Step::new(StepKind::Info, NO_TRACE)],
            time_complexity: Complexity::Unknown,
            execution_time: 0.0,
        }
    }
}

pub fn round_seconds(seconds: f64) -> f64 {
    (seconds * 10_000.0).round() / 10_000.0
}
