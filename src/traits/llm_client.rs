use async_trait::async_trait;

use crate::errors::CvResult;

/// Black-box text generation backend
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> CvResult<String>;

    /// Short identifier of the backend for logs
    fn describe(&self) -> String;
}
