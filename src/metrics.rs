//! Metrics derived from verification outcomes.
//!
//! [`summarize`] reports on a single loop run and only looks at its last
//! pass. [`summarize_dataset`] aggregates the per-requirement results of a
//! dataset run.

use crate::models::artifact::LoopStatus;
use crate::models::common::CheckTool;
use crate::models::metrics::{ DatasetSummary, Metrics, ResultAnalysis, VerificationCoverage };
use crate::models::pipeline::PipelineResult;
use crate::models::verification::{ IterationRecord, VerificationStatus };

/// Snapshot of the last record. Earlier passes do not affect the result.
/// An empty sequence yields [`Metrics::default`].
pub fn summarize(records: &[IterationRecord]) -> Metrics {
    let Some(last) = records.last() else {
        return Metrics::default();
    };

    let tool_passed = |tool: CheckTool| {
        last.outcomes
            .iter()
            .any(|o| o.tool == tool && o.status == VerificationStatus::Pass)
    };

    Metrics {
        iterations: records.len(),
        tests_passed: tool_passed(CheckTool::Tests),
        linter_passed: tool_passed(CheckTool::Linter),
        total_verifications: last.outcomes.len(),
        passed_verifications: last.outcomes
            .iter()
            .filter(|o| o.passed())
            .count(),
    }
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { (count as f64) / (total as f64) }
}

/// Aggregate statistics over a dataset run
pub fn summarize_dataset(results: &[PipelineResult]) -> DatasetSummary {
    if results.is_empty() {
        return DatasetSummary::default();
    }

    let total = results.len();
    let successes = results
        .iter()
        .filter(|r| r.final_status == LoopStatus::Success)
        .count();
    let iterations: usize = results
        .iter()
        .map(|r| r.iterations)
        .sum();
    let tests_passed = results
        .iter()
        .filter(|r| r.metrics.tests_passed)
        .count();
    let linter_passed = results
        .iter()
        .filter(|r| r.metrics.linter_passed)
        .count();

    let total_verifications: usize = results
        .iter()
        .map(|r| r.metrics.total_verifications)
        .sum();
    let passed_verifications: usize = results
        .iter()
        .map(|r| r.metrics.passed_verifications)
        .sum();

    DatasetSummary {
        total_requirements: total,
        pass_rate: fraction(successes, total),
        average_iterations: (iterations as f64) / (total as f64),
        test_pass_rate: fraction(tests_passed, total),
        linter_pass_rate: fraction(linter_passed, total),
        verification_coverage: VerificationCoverage {
            total: total_verifications,
            passed: passed_verifications,
            coverage: fraction(passed_verifications, total_verifications),
        },
    }
}

/// Dataset summary with the ids of failed and successful requirements.
/// Anything other than `success` counts as failed.
pub fn analyze(results: &[PipelineResult]) -> ResultAnalysis {
    let (success, failed): (Vec<&PipelineResult>, Vec<&PipelineResult>) = results
        .iter()
        .partition(|r| r.final_status == LoopStatus::Success);

    ResultAnalysis {
        summary: summarize_dataset(results),
        failed_cases: failed.len(),
        failed_case_ids: failed
            .iter()
            .map(|r| r.requirement_id.clone())
            .collect(),
        success_cases: success
            .iter()
            .map(|r| r.requirement_id.clone())
            .collect(),
    }
}
