use async_trait::async_trait;
use log::{ debug, info, warn };
use std::time::Duration;

use crate::implementations::checks::process::{ run_command, ProcessOutcome };
use crate::models::common::CheckTool;
use crate::models::verification::VerificationOutcome;
use crate::traits::verification_engine::{ Check, CheckRequest };

const MODULE_NAME: &str = "solution";
const CODE_FILE: &str = "solution.py";
const TEST_FILE: &str = "test_solution.py";

/// Runs generated pytest tests against the generated implementation
pub struct PytestCheck {
    python: String,
}

impl PytestCheck {
    pub fn new(python: impl Into<String>) -> Self {
        Self { python: python.into() }
    }

    /// Make the implementation visible to the tests unless they import it already
    fn test_source(tests: &str) -> String {
        let imports_solution = tests.lines().any(|line| {
            let line = line.trim();
            line.starts_with(&format!("from {} import", MODULE_NAME)) ||
                line.starts_with(&format!("import {}", MODULE_NAME))
        });

        if imports_solution {
            tests.to_string()
        } else {
            format!("from {} import *  # noqa: F401,F403\n\n{}", MODULE_NAME, tests)
        }
    }
}

#[async_trait]
impl Check for PytestCheck {
    fn tool(&self) -> CheckTool {
        CheckTool::Tests
    }

    fn name(&self) -> &str {
        "pytest"
    }

    async fn run_check(&self, request: CheckRequest<'_>) -> VerificationOutcome {
        let tool = self.tool();

        // Removed when `dir` drops, on every return path below.
        let dir = match tempfile::Builder::new().prefix("cv-tests-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return VerificationOutcome::error(
                    tool,
                    format!("Failed to prepare test directory: {}", e)
                );
            }
        };

        let files = [
            (CODE_FILE, request.code.to_string()),
            (TEST_FILE, Self::test_source(request.tests)),
        ];
        for (name, contents) in files {
            if let Err(e) = tokio::fs::write(dir.path().join(name), contents).await {
                return VerificationOutcome::error(tool, format!("Failed to write {}: {}", name, e));
            }
        }

        debug!("Running pytest in {}", dir.path().display());
        let outcome = run_command(
            &self.python,
            &["-m", "pytest", TEST_FILE, "-v", "--tb=short", "-p", "no:cacheprovider"],
            Some(dir.path()),
            request.timeout
        ).await;

        let result = interpret_pytest(&self.python, outcome);
        info!("Test verification result: {}", result.status);
        result
    }

    async fn is_available(&self) -> bool {
        matches!(
            run_command(&self.python, &["-m", "pytest", "--version"], None, Duration::from_secs(10)).await,
            ProcessOutcome::Completed { status, .. } if status.success()
        )
    }
}

/// Map a pytest process outcome onto a verification outcome
fn interpret_pytest(python: &str, outcome: ProcessOutcome) -> VerificationOutcome {
    let tool = CheckTool::Tests;
    let output = outcome.combined_output();

    match outcome {
        ProcessOutcome::Completed { status, stdout, stderr, .. } => {
            if stderr.contains("No module named pytest") {
                warn!("pytest is not installed for {}", python);
                return VerificationOutcome::skipped(tool, format!("pytest is not installed for {}", python));
            }

            match status.code() {
                Some(0) => VerificationOutcome::pass(tool, output),
                // 1: tests failed, 2: collection errors, 5: no tests collected
                Some(1) | Some(2) | Some(5) => {
                    VerificationOutcome::fail(tool, output, failure_lines(&stdout, &stderr))
                }
                code => {
                    VerificationOutcome::error(tool, format!("pytest exited abnormally ({:?}): {}", code, stderr.trim()))
                }
            }
        }
        ProcessOutcome::TimedOut => VerificationOutcome::timeout(tool),
        ProcessOutcome::NotFound => {
            VerificationOutcome::skipped(tool, format!("Python interpreter '{}' not found", python))
        }
        ProcessOutcome::Failed(e) => VerificationOutcome::error(tool, format!("Error running tests: {}", e)),
    }
}

/// Pull the lines that explain a pytest failure out of its report
fn failure_lines(stdout: &str, stderr: &str) -> Vec<String> {
    let mut lines: Vec<String> = stdout
        .lines()
        .filter(|line| {
            line.starts_with("FAILED ") || line.starts_with("ERROR ") || line.starts_with("E ")
        })
        .map(|line| line.trim_end().to_string())
        .collect();

    if lines.is_empty() {
        lines = stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
    }

    if lines.is_empty() {
        if let Some(last) = stdout.lines().rev().find(|line| !line.trim().is_empty()) {
            lines.push(last.trim().to_string());
        }
    }

    lines
}
