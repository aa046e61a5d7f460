// PowerShell script runner
// reason: tokio for async process management
//
// Scripts are fixed text passed on the command line; request data (selectors,
// domain, credentials) goes over stdin as JSON so it is never interpolated
// into script source. Scripts answer with a JSON envelope on stdout.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default per-script timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Failure classification reported by a script in its error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFault {
    pub kind: String,
    pub message: String,
}

/// JSON envelope every script writes to stdout
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ScriptEnvelope<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<ScriptFault>,
}

/// Runner errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The interpreter could not be started
    #[error("failed to start PowerShell: {0}")]
    Spawn(String),

    /// The script did not finish in time
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// Non-zero exit without an error envelope
    #[error("exited with {code:?}: {}", .stderr.trim())]
    Exit { code: Option<i32>, stderr: String },

    /// The script reported a classified failure
    #[error("{}", .0.message)]
    Fault(ScriptFault),

    /// Stdout was not a valid envelope
    #[error("unreadable script output: {0}")]
    Parse(String),
}

/// Spawns an interpreter per script invocation
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl ScriptRunner {
    /// Windows PowerShell (or pwsh) with profile loading and prompts disabled
    ///
    /// # Example
    /// ```ignore
    /// let runner = ScriptRunner::powershell("powershell.exe", Duration::from_secs(60));
    /// ```
    pub fn powershell(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            base_args: ["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-Command"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout,
        }
    }

    /// Arbitrary interpreter; the script is appended as the last argument
    pub fn custom(program: impl Into<String>, base_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            base_args,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `script`, feeding `input` as JSON on stdin, and decode the
    /// envelope's `result`
    pub async fn run<I, T>(&self, script: &str, input: &I) -> Result<T, RunError>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(input).map_err(|e| RunError::Parse(e.to_string()))?;
        let output = self.spawn_and_wait(script, &payload).await?;
        decode_envelope(&output)
    }

    async fn spawn_and_wait(
        &self,
        script: &str,
        payload: &[u8],
    ) -> Result<std::process::Output, RunError> {
        debug!(program = %self.program, timeout_secs = self.timeout.as_secs(), "Spawning script");

        let mut child = Command::new(&self.program)
            .args(&self.base_args)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunError::Spawn(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(payload).await {
                Ok(()) => {}
                // Script exited without reading its input; its exit status tells the rest
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("Script closed stdin before reading request");
                }
                Err(e) => return Err(RunError::Spawn(format!("writing stdin: {}", e))),
            }
            // Dropping stdin closes it so the script sees EOF
        }

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                info!(
                    program = %self.program,
                    exit_code = ?output.status.code(),
                    stdout_bytes = output.stdout.len(),
                    "Script completed"
                );
                Ok(output)
            }
            Ok(Err(e)) => Err(RunError::Spawn(e.to_string())),
            Err(_) => {
                warn!(program = %self.program, timeout_secs = self.timeout.as_secs(), "Script timed out");
                Err(RunError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

fn decode_envelope<T: DeserializeOwned>(output: &std::process::Output) -> Result<T, RunError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    // Scripts may print progress before the envelope; it is always the last line
    let last_line = stdout.lines().rev().find(|l| !l.trim().is_empty());

    let envelope = last_line.map(serde_json::from_str::<ScriptEnvelope<T>>);

    match envelope {
        Some(Ok(ScriptEnvelope {
            error: Some(fault), ..
        })) => Err(RunError::Fault(fault)),
        Some(Ok(ScriptEnvelope {
            result: Some(result),
            ..
        })) => Ok(result),
        _ if !output.status.success() => Err(RunError::Exit {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }),
        Some(Ok(_)) => Err(RunError::Parse("envelope has neither result nor error".to_string())),
        Some(Err(e)) => Err(RunError::Parse(e.to_string())),
        None => Err(RunError::Parse("no output".to_string())),
    }
}
