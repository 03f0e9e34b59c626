use serde::{ Deserialize, Serialize };
use std::fmt;

use crate::models::common::CheckTool;

/// Error text recorded when a check exceeds its time bound
pub const TIMEOUT_ERROR: &str = "Timeout";

/// Status of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// The check ran and found no defects
    Pass,
    /// The check ran to completion and reported defects
    Fail,
    /// The environment failed: timeout or the tool crashed
    Error,
    /// The check did not run (disabled tool, missing tool, unsupported language)
    Skipped,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Pass => write!(f, "pass"),
            VerificationStatus::Fail => write!(f, "fail"),
            VerificationStatus::Error => write!(f, "error"),
            VerificationStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of running one check against one code/test pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub tool: CheckTool,
    pub status: VerificationStatus,
    pub output: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl VerificationOutcome {
    pub fn new(
        tool: CheckTool,
        status: VerificationStatus,
        output: impl Into<String>,
        errors: Vec<String>,
        warnings: Vec<String>
    ) -> Self {
        Self {
            tool,
            status,
            output: output.into(),
            errors,
            warnings,
        }
    }

    pub fn pass(tool: CheckTool, output: impl Into<String>) -> Self {
        Self::new(tool, VerificationStatus::Pass, output, Vec::new(), Vec::new())
    }

    /// A logical failure: the check completed and found defects
    pub fn fail(tool: CheckTool, output: impl Into<String>, errors: Vec<String>) -> Self {
        Self::new(tool, VerificationStatus::Fail, output, errors, Vec::new())
    }

    /// The check exceeded its time bound
    pub fn timeout(tool: CheckTool) -> Self {
        Self::new(
            tool,
            VerificationStatus::Error,
            format!("{} check timed out", tool),
            vec![TIMEOUT_ERROR.to_string()],
            Vec::new()
        )
    }

    /// The check could not be executed for an environmental reason
    pub fn error(tool: CheckTool, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(tool, VerificationStatus::Error, message.clone(), vec![message], Vec::new())
    }

    /// The check did not run; `reason` goes to the raw output
    pub fn skipped(tool: CheckTool, reason: impl Into<String>) -> Self {
        Self::new(tool, VerificationStatus::Skipped, reason, Vec::new(), Vec::new())
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn passed(&self) -> bool {
        self.status == VerificationStatus::Pass
    }

    pub fn is_timeout(&self) -> bool {
        self.status == VerificationStatus::Error &&
            self.errors.len() == 1 &&
            self.errors[0] == TIMEOUT_ERROR
    }
}

/// Outcomes of one verify pass of the repair loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based pass number
    pub iteration: usize,
    #[serde(rename = "results")]
    pub outcomes: Vec<VerificationOutcome>,
}

impl IterationRecord {
    pub fn new(iteration: usize, outcomes: Vec<VerificationOutcome>) -> Self {
        Self { iteration, outcomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_outcome_is_error_not_fail() {
        let outcome = VerificationOutcome::timeout(CheckTool::Tests);
        assert_eq!(outcome.status, VerificationStatus::Error);
        assert_eq!(outcome.errors, vec!["Timeout".to_string()]);
        assert!(outcome.is_timeout());
        assert!(!outcome.passed());
    }

    #[test]
    fn record_serializes_like_result_files() {
        let record = IterationRecord::new(
            2,
            vec![VerificationOutcome::skipped(CheckTool::Formal, "not implemented")]
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["iteration"], 2);
        assert_eq!(value["results"][0]["tool"], "formal");
        assert_eq!(value["results"][0]["status"], "skipped");
    }
}
