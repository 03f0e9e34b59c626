use serde::{ Deserialize, Serialize };
use std::fmt;

use crate::models::metrics::Metrics;
use crate::models::verification::IterationRecord;

/// Implementation and tests produced by the generator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub code: String,
    pub tests: String,
    /// Free text the model wrote around the code blocks
    #[serde(default)]
    pub explanation: String,
}

impl CodeArtifact {
    pub fn new(code: impl Into<String>, tests: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            tests: tests.into(),
            explanation: String::new(),
        }
    }
}

/// Terminal status of a repair loop run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopStatus {
    /// Every check of the last pass returned `pass`
    Success,
    /// The iteration budget ran out without a passing pass
    Failed,
    /// No pass was attempted (zero budget)
    Unknown,
    /// Generation or repair failed, or the run was cancelled
    Aborted,
}

impl fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopStatus::Success => write!(f, "success"),
            LoopStatus::Failed => write!(f, "failed"),
            LoopStatus::Unknown => write!(f, "unknown"),
            LoopStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Why a loop ended in [`LoopStatus::Aborted`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum AbortReason {
    Generation(String),
    Repair(String),
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Generation(msg) => write!(f, "generation failed: {}", msg),
            AbortReason::Repair(msg) => write!(f, "repair failed: {}", msg),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Final value of a repair loop run, owned by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopResult {
    pub final_status: LoopStatus,
    /// Number of completed verify passes; always `iteration_records.len()`
    pub iterations: usize,
    pub code: String,
    pub tests: String,
    pub iteration_records: Vec<IterationRecord>,
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<AbortReason>,
}

impl LoopResult {
    pub fn is_success(&self) -> bool {
        self.final_status == LoopStatus::Success
    }
}
