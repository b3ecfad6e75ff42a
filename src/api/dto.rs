use serde::{Deserialize, Serialize};

use crate::domain::report::AnalysisReport;
use crate::domain::trace::Step;

/// One request line of the JSON-lines protocol.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    pub params: Option<serde_json::Value>,
}

/// Parameters of `ANALYZE`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeParams {
    pub code: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default = "default_run")]
    pub run: bool,
}

fn default_run() -> bool {
    true
}

/// Wire form of an `AnalysisReport`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ReportDto {
    pub output: String,
    pub error: String,
    pub trace: Vec<Step>,
    pub time_complexity: String,
    pub execution_time: f64,
}

impl From<AnalysisReport> for ReportDto {
    fn from(report: AnalysisReport) -> Self {
        ReportDto {
            output: report.output,
            error: report.error,
            trace: report.trace,
            time_complexity: report.time_complexity.to_string(),
            execution_time: report.execution_time,
        }
    }
}
