use crate::errors::CvResult;
use crate::models::artifact::CodeArtifact;

/// Turns raw model text into structured artifacts
pub trait ResponseExtractor: Send + Sync {
    /// Extract implementation, tests and explanation from a generation response
    fn extract_artifact(&self, raw: &str) -> CvResult<CodeArtifact>;

    /// Extract only the code from a repair response
    fn extract_code(&self, raw: &str) -> CvResult<String>;
}
