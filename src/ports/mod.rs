use crate::domain::ast::Module;
use crate::domain::error::ParseError;
use crate::domain::execution::{ExecutionOutcome, RunError};

pub mod report_exporter;

pub use report_exporter::{JsonExporter, ReportExporter, TextExporter};

/// Turns program text into a syntax tree.
pub trait SourceParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Module, ParseError>;
}

/// Executes a program for real, feeding `inputs` as stdin lines.
pub trait ProgramRunner: Send + Sync {
    fn run(&self, code: &str, inputs: &[String]) -> Result<ExecutionOutcome, RunError>;
}
