//! Report Exporters
//!
//! Render an `AnalysisReport` as human-readable text or as JSON.

use anyhow::{Context, Result};

use crate::domain::report::AnalysisReport;

pub trait ReportExporter {
    /// Render `report`; `title` names the analyzed source.
    fn render(&self, report: &AnalysisReport, title: &str) -> Result<String>;

    fn export(&self, report: &AnalysisReport, title: &str, path: &str) -> Result<()> {
        let content = self.render(report, title)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write report to {}", path))
    }
}

pub struct TextExporter;

impl ReportExporter for TextExporter {
    fn render(&self, report: &AnalysisReport, title: &str) -> Result<String> {
        let mut lines = Vec::new();

        lines.push(format!("== {} ==", title));
        lines.push(format!("Time complexity: {}", report.time_complexity));
        lines.push(format!("Execution time: {}s", report.execution_time));

        Self::section(&mut lines, "output", &report.output);
        Self::section(&mut lines, "error", &report.error);

        lines.push("--- trace ---".to_string());
        let width = report.trace.len().to_string().len();
        for (index, step) in report.trace.iter().enumerate() {
            let kind = serde_json::to_value(step.kind)?;
            lines.push(format!(
                "{:>width$}. [{}] {}",
                index + 1,
                kind.as_str().unwrap_or("?"),
                Self::single_line(&step.content),
                width = width
            ));
        }

        Ok(lines.join("\n"))
    }
}

impl TextExporter {
    fn section(lines: &mut Vec<String>, name: &str, body: &str) {
        if body.is_empty() {
            return;
        }
        lines.push(format!("--- {} ---", name));
        lines.extend(body.lines().map(str::to_string));
    }

    fn single_line(content: &str) -> String {
        content.replace('\\', "\\\\").replace('\n', "\\n")
    }
}

pub struct JsonExporter {
    pub pretty: bool,
}

impl ReportExporter for JsonExporter {
    fn render(&self, report: &AnalysisReport, _title: &str) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::complexity::Complexity;
    use crate::domain::trace::{Step, StepKind};

    fn sample() -> AnalysisReport {
        AnalysisReport {
            output: "7".to_string(),
            error: String::new(),
            trace: vec![
                Step::new(StepKind::Assign, "x = 7"),
                Step::new(StepKind::Print, "Print: 7"),
            ],
            time_complexity: Complexity::from_depth(0),
            execution_time: 0.0213,
        }
    }

    #[test]
    fn test_text_report() {
        let text = TextExporter.render(&sample(), "demo.py").unwrap();
        assert!(text.starts_with("== demo.py =="));
        assert!(text.contains("Time complexity: O(1)"));
        assert!(text.contains("--- output ---\n7"));
        assert!(!text.contains("--- error ---"));
        assert!(text.contains("1. [assign] x = 7"));
        assert!(text.contains("2. [print] Print: 7"));
    }

    #[test]
    fn test_json_report() {
        let json = JsonExporter { pretty: false }.render(&sample(), "demo.py").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["trace"][1]["type"], "print");
        assert_eq!(value["time_complexity"], "O(1)");
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let path = path.to_str().unwrap();
        TextExporter.export(&sample(), "demo.py", path).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("x = 7"));
    }
}
