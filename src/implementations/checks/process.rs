//! Time-bounded execution of external verification tools.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{ ExitStatus, Stdio };
use std::time::{ Duration, Instant };

use log::debug;
use tokio::process::Command;

/// How an external tool invocation ended
#[derive(Debug)]
pub enum ProcessOutcome {
    Completed {
        status: ExitStatus,
        stdout: String,
        stderr: String,
        duration: Duration,
    },
    /// The process exceeded its bound and was killed
    TimedOut,
    /// The program could not be located
    NotFound,
    /// Spawning or waiting failed for another reason
    Failed(std::io::Error),
}

impl ProcessOutcome {
    /// stdout followed by stderr, as a single report
    pub fn combined_output(&self) -> String {
        match self {
            ProcessOutcome::Completed { stdout, stderr, .. } => {
                if stderr.is_empty() {
                    stdout.clone()
                } else {
                    format!("{}{}", stdout, stderr)
                }
            }
            _ => String::new(),
        }
    }
}

/// Run `program args...` in `cwd`, killing it if it outlives `timeout`.
pub async fn run_command(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration
) -> ProcessOutcome {
    let start = Instant::now();
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} not found on PATH", program);
            return ProcessOutcome::NotFound;
        }
        Err(e) => {
            return ProcessOutcome::Failed(e);
        }
    };

    // Dropping the wait future on timeout drops the child, which kills it.
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let duration = start.elapsed();
            debug!("{} exited with {} after {:?}", program, output.status, duration);
            ProcessOutcome::Completed {
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                duration,
            }
        }
        Ok(Err(e)) => ProcessOutcome::Failed(e),
        Err(_) => {
            debug!("{} timed out after {:?}", program, timeout);
            ProcessOutcome::TimedOut
        }
    }
}
