/// Sandboxed program runner.
///
/// Writes the program to a temporary file, runs it with the configured
/// interpreter, feeds the input lines on stdin and enforces a wall-clock
/// timeout. The child is killed when the deadline passes and the temporary
/// file is removed when the run ends.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::execution::{ExecutionOutcome, RunError};
use crate::infrastructure::config::RunnerConfig;
use crate::ports::ProgramRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long the pipe threads of a killed child get to finish.
const PIPE_GRACE: Duration = Duration::from_millis(500);

// ═══════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct SandboxRunner {
    pub interpreter: String,
    /// Arguments placed before the script path.
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl SandboxRunner {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for SandboxRunner {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

impl ProgramRunner for SandboxRunner {
    fn run(&self, code: &str, inputs: &[String]) -> Result<ExecutionOutcome, RunError> {
        let mut script = tempfile::Builder::new()
            .prefix("stepwise-")
            .suffix(".py")
            .tempfile()?;
        script.write_all(code.as_bytes())?;
        script.flush()?;

        let spec = build_command_spec(&self.interpreter, &self.args, script.path());
        debug!(program = %spec.program, script = %script.path().display(), "spawning sandboxed run");

        let start = Instant::now();
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        // Feed stdin concurrently with draining stdout/stderr.
        let stdin_data = inputs.join("\n");
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // The program may exit without reading; a broken pipe is fine.
                let _ = stdin.write_all(stdin_data.as_bytes());
            }
        });
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                warn!(timeout = ?self.timeout, "sandboxed run timed out, child killed");

                // A surviving grandchild can hold the pipes open past the kill.
                let deadline = Instant::now() + PIPE_GRACE;
                let writer_done = join_until(writer, deadline).is_some();
                let stdout_done = join_until(stdout, deadline).is_some();
                let stderr_done = join_until(stderr, deadline).is_some();
                if !(writer_done && stdout_done && stderr_done) {
                    warn!(grace = ?PIPE_GRACE, "pipes still open after kill, leaving their threads detached");
                }
                return Err(RunError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };
        let elapsed = start.elapsed();

        let _ = writer.join();
        let outcome = ExecutionOutcome {
            stdout: join_reader(stdout)?,
            stderr: join_reader(stderr)?,
            exit_code: status.code(),
            elapsed,
        };
        debug!(exit_code = ?outcome.exit_code, elapsed = ?elapsed, "sandboxed run finished");
        Ok(outcome)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Internal Implementation
// ═══════════════════════════════════════════════════════════════════════════

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut source) = source {
            source.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

/// Join `handle` if it finishes before `deadline`.
fn join_until<T>(handle: JoinHandle<T>, deadline: Instant) -> Option<T> {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(POLL_INTERVAL);
    }
    handle.join().ok()
}

fn join_reader(handle: JoinHandle<io::Result<Vec<u8>>>) -> Result<String, RunError> {
    let bytes = handle
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ═══════════════════════════════════════════════════════════════════════════
// Testable Command Builder
// ═══════════════════════════════════════════════════════════════════════════

/// The command a run would execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

pub fn build_command_spec(interpreter: &str, args: &[String], script: &Path) -> RunCommandSpec {
    let mut all_args = args.to_vec();
    all_args.push(script.to_string_lossy().into_owned());
    RunCommandSpec {
        program: interpreter.to_string(),
        args: all_args,
    }
}
