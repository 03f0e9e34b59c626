use async_trait::async_trait;
use log::{ debug, info, warn };
use std::time::Duration;

use crate::implementations::checks::process::{ run_command, ProcessOutcome };
use crate::models::common::CheckTool;
use crate::models::verification::VerificationOutcome;
use crate::traits::verification_engine::{ Check, CheckRequest };

const CODE_FILE: &str = "solution.py";
/// Bit set in pylint's exit status when it was invoked incorrectly
const PYLINT_USAGE_ERROR: i32 = 32;

/// Static analyzers the linter check knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonLinter {
    /// pylint restricted to error and fatal messages
    Pylint,
    Flake8,
}

impl PythonLinter {
    pub fn program(&self) -> &'static str {
        match self {
            PythonLinter::Pylint => "pylint",
            PythonLinter::Flake8 => "flake8",
        }
    }

    fn args(&self) -> Vec<&'static str> {
        match self {
            PythonLinter::Pylint => vec!["--disable=all", "--enable=E,F", "--score=n", CODE_FILE],
            PythonLinter::Flake8 => vec![CODE_FILE],
        }
    }

    /// Judge a completed run from its exit code and output
    fn judge(&self, exit_code: Option<i32>, stdout: &str, stderr: &str) -> LintVerdict {
        let code = match exit_code {
            Some(code) => code,
            None => {
                return LintVerdict::Broken(format!("{} was terminated by a signal", self.program()));
            }
        };
        let lines: Vec<&str> = stdout
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();

        match self {
            PythonLinter::Pylint => {
                // A non-zero exit with nothing on stdout is a crash, not a finding
                if code & PYLINT_USAGE_ERROR != 0 || (code != 0 && lines.is_empty()) {
                    return LintVerdict::Broken(crash_report(self.program(), code, stderr));
                }
                let mut errors = Vec::new();
                let mut warnings = Vec::new();
                for line in lines {
                    match pylint_category(line) {
                        Some('E') | Some('F') => errors.push(line.to_string()),
                        Some(_) => warnings.push(line.to_string()),
                        None => {}
                    }
                }
                if errors.is_empty() {
                    LintVerdict::Clean(warnings)
                } else {
                    LintVerdict::Findings { errors, warnings }
                }
            }
            PythonLinter::Flake8 => {
                if code == 0 {
                    LintVerdict::Clean(Vec::new())
                } else if lines.is_empty() {
                    LintVerdict::Broken(crash_report(self.program(), code, stderr))
                } else {
                    LintVerdict::Findings {
                        errors: lines.into_iter().map(str::to_string).collect(),
                        warnings: Vec::new(),
                    }
                }
            }
        }
    }
}

/// What a completed linter run says about the code
#[derive(Debug, PartialEq, Eq)]
enum LintVerdict {
    /// No errors; carries the warnings
    Clean(Vec<String>),
    Findings {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
    /// The tool itself failed
    Broken(String),
}

fn crash_report(program: &str, code: i32, stderr: &str) -> String {
    let detail = stderr.trim();
    if detail.is_empty() {
        format!("{} exited with status {}", program, code)
    } else {
        format!("{} exited with status {}: {}", program, code, detail)
    }
}

/// Category letter of a pylint message such as `solution.py:3:4: E0602: ...`
fn pylint_category(line: &str) -> Option<char> {
    line.split(':').map(str::trim).find_map(|part| {
        let mut chars = part.chars();
        let category = chars.next()?;
        let digits: String = chars.collect();
        let is_code = "EFWCRI".contains(category) &&
            digits.len() == 4 &&
            digits.chars().all(|c| c.is_ascii_digit());
        is_code.then_some(category)
    })
}

/// Static analysis of generated Python code, with an optional fallback tool
pub struct LinterCheck {
    primary: PythonLinter,
    fallback: Option<PythonLinter>,
}

impl LinterCheck {
    pub fn new(primary: PythonLinter, fallback: Option<PythonLinter>) -> Self {
        Self { primary, fallback }
    }

    /// pylint, falling back to flake8 when pylint is not installed
    pub fn python_default() -> Self {
        Self::new(PythonLinter::Pylint, Some(PythonLinter::Flake8))
    }

    fn candidates(&self) -> impl Iterator<Item = PythonLinter> + '_ {
        std::iter::once(self.primary).chain(self.fallback)
    }
}

#[async_trait]
impl Check for LinterCheck {
    fn tool(&self) -> CheckTool {
        CheckTool::Linter
    }

    fn name(&self) -> &str {
        self.primary.program()
    }

    async fn run_check(&self, request: CheckRequest<'_>) -> VerificationOutcome {
        let tool = self.tool();

        let dir = match tempfile::Builder::new().prefix("cv-lint-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return VerificationOutcome::error(tool, format!("Failed to prepare lint directory: {}", e));
            }
        };
        if let Err(e) = tokio::fs::write(dir.path().join(CODE_FILE), request.code).await {
            return VerificationOutcome::error(tool, format!("Failed to write {}: {}", CODE_FILE, e));
        }

        for linter in self.candidates() {
            debug!("Running {}", linter.program());
            let args = linter.args();
            let outcome = run_command(linter.program(), &args, Some(dir.path()), request.timeout).await;
            let output = outcome.combined_output();

            let result = match outcome {
                ProcessOutcome::NotFound => {
                    warn!("{} not installed, trying next linter", linter.program());
                    continue;
                }
                ProcessOutcome::Completed { status, stdout, stderr, .. } => {
                    match linter.judge(status.code(), &stdout, &stderr) {
                        LintVerdict::Clean(warnings) => {
                            VerificationOutcome::pass(tool, output).with_warnings(warnings)
                        }
                        LintVerdict::Findings { errors, warnings } => {
                            VerificationOutcome::fail(tool, output, errors).with_warnings(warnings)
                        }
                        LintVerdict::Broken(message) => {
                            warn!("{}", message);
                            VerificationOutcome::error(tool, message)
                        }
                    }
                }
                ProcessOutcome::TimedOut => VerificationOutcome::timeout(tool),
                ProcessOutcome::Failed(e) => {
                    VerificationOutcome::error(tool, format!("Error running {}: {}", linter.program(), e))
                }
            };
            info!("Linter ({}) result: {}", linter.program(), result.status);
            return result;
        }

        VerificationOutcome::skipped(tool, "No linter available (pylint or flake8)")
    }

    async fn is_available(&self) -> bool {
        for linter in self.candidates() {
            let probe = run_command(linter.program(), &["--version"], None, Duration::from_secs(10)).await;
            if matches!(probe, ProcessOutcome::Completed { status, .. } if status.success()) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pylint_categories_are_recognised() {
        assert_eq!(pylint_category("solution.py:3:4: E0602: Undefined variable 'x' (undefined-variable)"), Some('E'));
        assert_eq!(pylint_category("solution.py:1:0: W0611: Unused import os (unused-import)"), Some('W'));
        assert_eq!(pylint_category("************* Module solution"), None);
    }

    #[test]
    fn pylint_passes_with_only_warnings() {
        let stdout = "************* Module solution\nsolution.py:1:0: W0611: Unused import os (unused-import)\n";
        let verdict = PythonLinter::Pylint.judge(Some(4), stdout, "");
        assert_eq!(
            verdict,
            LintVerdict::Clean(vec!["solution.py:1:0: W0611: Unused import os (unused-import)".to_string()])
        );
    }

    #[test]
    fn pylint_fails_on_error_messages() {
        let stdout = "solution.py:3:4: E0602: Undefined variable 'x' (undefined-variable)\n";
        match PythonLinter::Pylint.judge(Some(2), stdout, "") {
            LintVerdict::Findings { errors, warnings } => {
                assert_eq!(errors.len(), 1);
                assert!(warnings.is_empty());
            }
            other => panic!("expected findings, got {:?}", other),
        }
    }

    #[test]
    fn pylint_usage_error_is_not_a_pass() {
        let verdict = PythonLinter::Pylint.judge(Some(32), "", "pylint: error: no such option: --score");
        assert_eq!(
            verdict,
            LintVerdict::Broken("pylint exited with status 32: pylint: error: no such option: --score".to_string())
        );
    }

    #[test]
    fn pylint_crash_without_output_is_broken() {
        let verdict = PythonLinter::Pylint.judge(Some(1), "", "Traceback (most recent call last):\n  ...\n");
        assert!(matches!(verdict, LintVerdict::Broken(message) if message.contains("Traceback")));

        let verdict = PythonLinter::Pylint.judge(None, "", "");
        assert_eq!(verdict, LintVerdict::Broken("pylint was terminated by a signal".to_string()));
    }

    #[test]
    fn flake8_uses_exit_status() {
        let verdict = PythonLinter::Flake8.judge(Some(1), "solution.py:1:1: F401 'os' imported but unused\n", "");
        assert_eq!(
            verdict,
            LintVerdict::Findings {
                errors: vec!["solution.py:1:1: F401 'os' imported but unused".to_string()],
                warnings: Vec::new(),
            }
        );

        assert_eq!(PythonLinter::Flake8.judge(Some(0), "", ""), LintVerdict::Clean(Vec::new()));
    }

    #[test]
    fn flake8_crash_reports_stderr() {
        let verdict = PythonLinter::Flake8.judge(Some(1), "", "ImportError: cannot import name 'x'\n");
        assert_eq!(
            verdict,
            LintVerdict::Broken("flake8 exited with status 1: ImportError: cannot import name 'x'".to_string())
        );
    }

    #[test]
    fn fallback_is_tried_after_primary() {
        let check = LinterCheck::python_default();
        let order: Vec<&str> = check.candidates().map(|l| l.program()).collect();
        assert_eq!(order, vec!["pylint", "flake8"]);
    }
}
