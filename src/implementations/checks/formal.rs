use async_trait::async_trait;

use crate::models::common::CheckTool;
use crate::models::verification::VerificationOutcome;
use crate::traits::verification_engine::{ Check, CheckRequest };

/// Formal verification slot. Translating generated code into a checkable
/// model (TLA+, Alloy, SMT) is not wired up, so every run reports `skipped`.
pub struct FormalPlaceholder;

#[async_trait]
impl Check for FormalPlaceholder {
    fn tool(&self) -> CheckTool {
        CheckTool::Formal
    }

    fn name(&self) -> &str {
        "formal-placeholder"
    }

    async fn run_check(&self, request: CheckRequest<'_>) -> VerificationOutcome {
        VerificationOutcome::skipped(
            self.tool(),
            format!("Formal verification is not implemented for {}", request.language)
        ).with_warnings(vec!["Formal verification requires additional configuration".to_string()])
    }

    async fn is_available(&self) -> bool {
        false
    }
}
