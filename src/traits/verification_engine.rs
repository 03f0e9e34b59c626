use std::time::Duration;
use async_trait::async_trait;

use crate::models::common::{ CheckTool, Language };
use crate::models::verification::VerificationOutcome;

/// Inputs handed to a single check
#[derive(Debug, Clone, Copy)]
pub struct CheckRequest<'a> {
    pub code: &'a str,
    pub tests: &'a str,
    pub language: &'a Language,
    pub timeout: Duration,
}

/// One verification technique for one language
///
/// `run_check` never fails: timeouts, missing tools and crashes are encoded in
/// the returned outcome's status and errors.
#[async_trait]
pub trait Check: Send + Sync {
    /// Which slot of the verification report this check fills
    fn tool(&self) -> CheckTool;

    /// Human-readable name of the underlying tool (e.g. "pytest")
    fn name(&self) -> &str;

    /// Run the check against a code/test pair
    async fn run_check(&self, request: CheckRequest<'_>) -> VerificationOutcome;

    /// Probe whether the underlying tool can be invoked at all
    async fn is_available(&self) -> bool {
        true
    }
}
