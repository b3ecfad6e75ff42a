// Command-line entry point for Stepwise.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stepwise::api::server;
use stepwise::application::AnalyzeUsecase;
use stepwise::domain::report::AnalysisReport;
use stepwise::infrastructure::concurrency::init_thread_pool;
use stepwise::infrastructure::config::AnalyzerConfig;
use stepwise::infrastructure::{SandboxRunner, ScriptParser};
use stepwise::ports::{JsonExporter, ReportExporter, TextExporter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run, trace and classify one or more scripts
    Analyze(AnalyzeArgs),
    /// Serve the JSON-lines API over TCP
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Script files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Input line fed to the program (repeatable, in order)
    #[arg(short, long = "input")]
    inputs: Vec<String>,

    /// File whose lines are appended to the inputs
    #[arg(long)]
    inputs_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the real execution; only trace and classify
    #[arg(long)]
    no_run: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interpreter used for the real run (overrides the config file)
    #[arg(long)]
    interpreter: Option<String>,

    /// Timeout in seconds for the real run (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stepwise=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => analyze(args),
        Command::Serve { port, config } => {
            let config = AnalyzerConfig::load_or_default(config.as_deref())?;
            let port = port.unwrap_or(config.server.port);
            server::start_server_with_config(port, config)
        }
    }
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = AnalyzerConfig::load_or_default(args.config.as_deref())?;
    if let Some(interpreter) = args.interpreter {
        config.runner.interpreter = interpreter;
    }
    if let Some(timeout) = args.timeout {
        config.runner.timeout_secs = timeout;
    }

    let mut inputs = args.inputs;
    if let Some(path) = &args.inputs_file {
        let text = fs::read_to_string(path).with_context(|| format!("Cannot read inputs file {}", path.display()))?;
        inputs.extend(text.lines().map(str::to_string));
    }

    let mut sources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match fs::read_to_string(path) {
            Ok(code) => sources.push((path.display().to_string(), code)),
            Err(e) => warn!(path = %path.display(), error = %e, "cannot read input file"),
        }
    }
    if sources.is_empty() {
        bail!("None of the given files could be read");
    }

    if sources.len() > 1 {
        if let Err(e) = init_thread_pool() {
            warn!(error = %e, "falling back to the default thread pool");
        }
    }

    let runner = SandboxRunner::from_config(&config.runner);
    let usecase = AnalyzeUsecase {
        parser: &ScriptParser,
        runner: &runner,
        limits: config.trace,
    };

    let reports: Vec<(String, AnalysisReport)> = sources
        .par_iter()
        .map(|(name, code)| (name.clone(), usecase.run(code, &inputs, !args.no_run)))
        .collect();

    let rendered = render(&reports, args.format)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), files = reports.len(), "report written");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn render(reports: &[(String, AnalysisReport)], format: Format) -> Result<String> {
    match format {
        Format::Text => {
            let sections = reports
                .iter()
                .map(|(name, report)| TextExporter.render(report, name))
                .collect::<Result<Vec<_>>>()?;
            Ok(sections.join("\n\n"))
        }
        Format::Json if reports.len() == 1 => JsonExporter { pretty: true }.render(&reports[0].1, &reports[0].0),
        Format::Json => {
            let map: serde_json::Map<String, serde_json::Value> = reports
                .iter()
                .map(|(name, report)| -> Result<(String, serde_json::Value)> {
                    Ok((name.clone(), serde_json::to_value(report)?))
                })
                .collect::<Result<_>>()?;
            Ok(serde_json::to_string_pretty(&map)?)
        }
    }
}
