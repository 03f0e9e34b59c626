use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

use crate::models::artifact::{ AbortReason, LoopResult, LoopStatus };
use crate::models::clarification::{ ClarificationQuestion, DesignDiagram };
use crate::models::metrics::Metrics;
use crate::models::verification::IterationRecord;

/// Everything the pipeline produced for one requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub requirement_id: String,
    pub original_requirement: String,
    pub refined_requirement: String,
    pub clarification_questions: Vec<ClarificationQuestion>,
    pub uml_diagrams: Vec<DesignDiagram>,
    pub generated_code: String,
    pub generated_tests: String,
    pub verification_results: Vec<IterationRecord>,
    pub iterations: usize,
    pub final_status: LoopStatus,
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<AbortReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineResult {
    /// Assemble a result from the upstream stages and the loop outcome
    pub fn from_loop(
        requirement_id: &str,
        original_requirement: &str,
        refined_requirement: String,
        clarification_questions: Vec<ClarificationQuestion>,
        uml_diagrams: Vec<DesignDiagram>,
        loop_result: LoopResult,
        started_at: DateTime<Utc>
    ) -> Self {
        Self {
            requirement_id: requirement_id.to_string(),
            original_requirement: original_requirement.to_string(),
            refined_requirement,
            clarification_questions,
            uml_diagrams,
            generated_code: loop_result.code,
            generated_tests: loop_result.tests,
            verification_results: loop_result.iteration_records,
            iterations: loop_result.iterations,
            final_status: loop_result.final_status,
            metrics: loop_result.metrics,
            abort_reason: loop_result.abort_reason,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// One entry of a requirements dataset file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "text")]
    pub requirement: String,
}
