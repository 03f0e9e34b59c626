//! Reduces the outcomes of one verify pass to a decision and repair feedback.

use crate::models::verification::{ VerificationOutcome, VerificationStatus };

/// Error lines per failing check carried into the digest
pub const DIGEST_ERRORS_PER_TOOL: usize = 3;

/// True iff every outcome passed. `skipped` and `error` count as not passed;
/// an empty pass is vacuously successful.
pub fn all_passed(outcomes: &[VerificationOutcome]) -> bool {
    outcomes.iter().all(VerificationOutcome::passed)
}

/// Condensed repair feedback built from the `fail` outcomes only.
///
/// Each failing check contributes `"[tool] "` followed by its first three
/// error lines; entries are separated by a blank line.
pub fn error_digest(outcomes: &[VerificationOutcome]) -> String {
    outcomes
        .iter()
        .filter(|outcome| outcome.status == VerificationStatus::Fail)
        .map(|outcome| {
            let head: Vec<&str> = outcome.errors
                .iter()
                .take(DIGEST_ERRORS_PER_TOOL)
                .map(String::as_str)
                .collect();
            format!("[{}] {}", outcome.tool, head.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
