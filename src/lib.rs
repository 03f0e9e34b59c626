pub mod models;
pub mod traits;
pub mod errors;
pub mod config;
pub mod implementations;
pub mod verification;
pub mod repair_loop;
pub mod metrics;
pub mod pipeline;
pub mod storage;
#[cfg(test)]
pub mod tests;

// Re-export core components
pub use config::{ LoopConfig, RunnerConfig };
pub use errors::{ CvError, CvResult };
pub use implementations::config::{ ModelConfig, PipelineConfig, VerifyConfig };
pub use implementations::{
    build_client,
    AnswerSource,
    Clarifier,
    DiagramGenerator,
    FencedBlockExtractor,
    LlmCodeGenerator,
    LogObserver,
    MockLlmClient,
};
pub use metrics::{ analyze, summarize, summarize_dataset };
pub use models::{
    common::{ CheckTool, Language },
    verification::{ IterationRecord, VerificationOutcome, VerificationStatus },
    artifact::{ AbortReason, CodeArtifact, LoopResult, LoopStatus },
    metrics::{ DatasetSummary, Metrics, ResultAnalysis },
    pipeline::{ DatasetItem, PipelineResult },
};
pub use pipeline::{ AnswerMode, Pipeline };
pub use repair_loop::{ LoopState, RepairLoop };
pub use traits::{ Check, CheckRequest, CodeGenerator, LlmClient, LoopObserver, NoopObserver };
pub use verification::{ all_passed, error_digest, CheckRegistry, VerificationRunner };

// Cancellation handle accepted by the loop and the pipeline
pub use tokio_util::sync::CancellationToken;
