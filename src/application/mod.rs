// Use cases: the orchestrator that combines real execution with the static
// analyses.

use tracing::{debug, info, warn};

use crate::domain::complexity::{Complexity, ComplexityEstimator};
use crate::domain::report::{round_seconds, AnalysisReport, TIMED_OUT};
use crate::domain::trace::{self, Step, StepKind, TraceLimits};
use crate::ports::{ProgramRunner, SourceParser};

/// Parse `source` and synthesize its trace. A parse failure yields a single
/// `error` step.
pub fn synthesize_trace(parser: &dyn SourceParser, source: &str, inputs: &[String], limits: TraceLimits) -> Vec<Step> {
    match parser.parse(source) {
        Ok(module) => trace::synthesize(&module, inputs, limits),
        Err(e) => vec![Step::new(StepKind::Error, format!("Error generating trace: {}", e))],
    }
}

/// Parse `source` and classify its loop nesting; `O(?)` when it does not parse.
pub fn estimate_complexity(parser: &dyn SourceParser, source: &str) -> Complexity {
    match parser.parse(source) {
        Ok(module) => ComplexityEstimator::estimate(&module),
        Err(_) => Complexity::Unknown,
    }
}

pub struct AnalyzeUsecase<'a> {
    pub parser: &'a dyn SourceParser,
    pub runner: &'a dyn ProgramRunner,
    pub limits: TraceLimits,
}

impl<'a> AnalyzeUsecase<'a> {
    /// Run the program for real (unless `execute` is false), then synthesize
    /// its trace and estimate its complexity.
    pub fn run(&self, code: &str, inputs: &[String], execute: bool) -> AnalysisReport {
        let mut report = AnalysisReport::default();

        if execute {
            match self.runner.run(code, inputs) {
                Ok(outcome) => {
                    report.output = outcome.stdout.trim().to_string();
                    report.error = outcome.stderr.trim().to_string();
                    report.execution_time = round_seconds(outcome.elapsed.as_secs_f64());
                    debug!(exit_code = ?outcome.exit_code, "program finished");
                }
                Err(e) if e.is_timeout() => {
                    warn!("program timed out");
                    report.error = TIMED_OUT.to_string();
                }
                Err(e) => {
                    warn!(error = %e, "program could not be run");
                    report.error = format!("Error: {}", e);
                }
            }
        }

        let steps = synthesize_trace(self.parser, code, inputs, self.limits);
        report.time_complexity = estimate_complexity(self.parser, code);
        info!(
            steps = steps.len(),
            complexity = %report.time_complexity,
            "analysis complete"
        );
        report.with_trace(steps)
    }
}
