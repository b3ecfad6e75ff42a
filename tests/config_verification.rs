use std::io::Write;

use stepwise::infrastructure::config::{AnalyzerConfig, DEFAULT_PORT};
use stepwise::infrastructure::SandboxRunner;

#[test]
fn test_load_overrides_field_by_field() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[runner]\ninterpreter = \"python3.12\"\n\n[trace]\nmax_while_iterations = 25").unwrap();

    let config = AnalyzerConfig::load(file.path()).unwrap();
    assert_eq!(config.runner.interpreter, "python3.12");
    assert_eq!(config.runner.timeout_secs, 10);
    assert_eq!(config.trace.max_while_iterations, 25);
    assert_eq!(config.trace.max_steps, 10_000);
    assert_eq!(config.server.port, DEFAULT_PORT);

    let runner = SandboxRunner::from_config(&config.runner);
    assert_eq!(runner.interpreter, "python3.12");
    assert_eq!(runner.timeout.as_secs(), 10);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = AnalyzerConfig::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.toml"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[trace\nmax_steps = 1").unwrap();
    assert!(AnalyzerConfig::load(file.path()).is_err());
}
