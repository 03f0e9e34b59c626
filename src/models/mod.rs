pub mod common;
pub mod verification;
pub mod artifact;
pub mod metrics;
pub mod clarification;
pub mod pipeline;

// Re-export common model types
pub use common::{ CheckTool, Language };
pub use verification::{ IterationRecord, VerificationOutcome, VerificationStatus, TIMEOUT_ERROR };
pub use artifact::{ AbortReason, CodeArtifact, LoopResult, LoopStatus };
pub use metrics::{ DatasetSummary, Metrics, ResultAnalysis, VerificationCoverage };
pub use clarification::{ ClarificationAnswer, ClarificationQuestion, DesignDiagram };
pub use pipeline::{ DatasetItem, PipelineResult };
