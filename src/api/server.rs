use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, error, info};

use crate::api::dto::{AnalyzeParams, CommandRequest, ReportDto};
use crate::application::AnalyzeUsecase;
use crate::infrastructure::config::AnalyzerConfig;
use crate::infrastructure::{SandboxRunner, ScriptParser};

/// Shared, read-only state handed to every connection.
struct ServerState {
    config: AnalyzerConfig,
    runner: SandboxRunner,
}

pub fn start_server(port: u16) -> Result<()> {
    start_server_with_config(port, AnalyzerConfig::default())
}

pub fn start_server_with_config(port: u16, config: AnalyzerConfig) -> Result<()> {
    let address = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&address).with_context(|| format!("Failed to bind to {}", address))?;

    info!(%address, "API server listening");

    let state = Arc::new(ServerState {
        runner: SandboxRunner::from_config(&config.runner),
        config,
    });

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &state) {
                        error!(error = %e, "connection error");
                    }
                });
            }
            Err(e) => error!(error = %e, "accept error"),
        }
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream, state: &ServerState) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (response, shutdown) = match process_command(trimmed, state) {
            Ok(reply) => (
                json!({
                    "status": "success",
                    "data": reply.data
                }),
                reply.shutdown,
            ),
            Err(e) => (
                json!({
                    "status": "error",
                    "message": format!("{:#}", e)
                }),
                false,
            ),
        };

        let response_str = serde_json::to_string(&response)?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;

        if shutdown {
            info!("shutdown requested");
            std::process::exit(0);
        }
    }
    Ok(())
}

struct Reply {
    data: serde_json::Value,
    shutdown: bool,
}

impl Reply {
    fn data(data: serde_json::Value) -> Self {
        Self { data, shutdown: false }
    }
}

fn process_command(json_str: &str, state: &ServerState) -> Result<Reply> {
    let req: CommandRequest = serde_json::from_str(json_str).context("Invalid JSON format")?;
    debug!(command = %req.command, "received command");

    match req.command.as_str() {
        "PING" => Ok(Reply::data(json!("PONG"))),
        "ANALYZE" => handle_analyze(req.params, state).map(Reply::data),
        "SHUTDOWN" => Ok(Reply {
            data: json!("Shutting down..."),
            shutdown: true,
        }),
        _ => anyhow::bail!("Unknown command: {}", req.command),
    }
}

fn handle_analyze(params: Option<serde_json::Value>, state: &ServerState) -> Result<serde_json::Value> {
    let params = params.ok_or_else(|| anyhow::anyhow!("Missing params for ANALYZE"))?;
    let params: AnalyzeParams = serde_json::from_value(params).context("Invalid ANALYZE params")?;

    let usecase = AnalyzeUsecase {
        parser: &ScriptParser,
        runner: &state.runner,
        limits: state.config.trace,
    };
    let report = usecase.run(&params.code, &params.inputs, params.run);

    Ok(serde_json::to_value(ReportDto::from(report))?)
}
