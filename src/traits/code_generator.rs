use async_trait::async_trait;

use crate::errors::CvResult;
use crate::models::artifact::CodeArtifact;

/// Trait for producing and repairing code artifacts
///
/// Any error returned here is a generation failure: the repair loop stops in
/// the aborted state and does not retry.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate an implementation and its tests for a refined requirement
    async fn generate_code(
        &self,
        requirement: &str,
        design_hint: Option<&str>,
    ) -> CvResult<CodeArtifact>;

    /// Produce a revised implementation from the current code and an error digest
    async fn repair_code(&self, code: &str, error_digest: &str) -> CvResult<String>;
}
