//! The generate → verify → repair state machine.
//!
//! One [`RepairLoop::run`] call owns its iteration records and the current
//! artifact. It makes at most `max_iterations` verify passes, performs no
//! calls after reaching a terminal state, and replaces only the code (never
//! the tests) when repairing.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::LoopConfig;
use crate::errors::{ CvError, CvResult };
use crate::implementations::log_observer::LogObserver;
use crate::metrics::summarize;
use crate::models::artifact::{ AbortReason, CodeArtifact, LoopResult, LoopStatus };
use crate::models::verification::IterationRecord;
use crate::traits::code_generator::CodeGenerator;
use crate::traits::loop_observer::LoopObserver;
use crate::verification::aggregator::{ all_passed, error_digest };
use crate::verification::runner::VerificationRunner;

/// States of a loop run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Generating,
    Verifying,
    Repairing,
    Success,
    Failed,
    Aborted(AbortReason),
}

/// Why a guarded generator call did not produce a value
enum CallError {
    Failed(CvError),
    Cancelled,
}

pub struct RepairLoop {
    generator: Arc<dyn CodeGenerator>,
    runner: Arc<VerificationRunner>,
    observer: Arc<dyn LoopObserver>,
    config: LoopConfig,
}

impl RepairLoop {
    /// Create a loop that reports transitions through [`LogObserver`]
    pub fn new(
        generator: Arc<dyn CodeGenerator>,
        runner: Arc<VerificationRunner>,
        config: LoopConfig
    ) -> Self {
        Self {
            generator,
            runner,
            observer: Arc::new(LogObserver),
            config,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LoopObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Drive the loop for one refined requirement until a terminal state.
    pub async fn run(
        &self,
        requirement: &str,
        design_hint: Option<&str>,
        cancel: &CancellationToken
    ) -> LoopResult {
        let max_iterations = self.config.max_iterations;
        let mut artifact = CodeArtifact::default();
        let mut records: Vec<IterationRecord> = Vec::new();

        // The bound is checked before anything is generated.
        if max_iterations == 0 {
            return self.finish(LoopStatus::Unknown, artifact, records, None);
        }

        let mut iteration = 1;
        let mut state = LoopState::Generating;

        loop {
            state = match state {
                LoopState::Generating => {
                    if cancel.is_cancelled() {
                        LoopState::Aborted(AbortReason::Cancelled)
                    } else {
                        self.observer.on_iteration_start(iteration, max_iterations, true);
                        let call = self.generator.generate_code(requirement, design_hint);
                        match self.guarded(call, cancel).await {
                            Ok(generated) => {
                                artifact = generated;
                                LoopState::Verifying
                            }
                            Err(CallError::Cancelled) => LoopState::Aborted(AbortReason::Cancelled),
                            Err(CallError::Failed(e)) => {
                                LoopState::Aborted(AbortReason::Generation(e.to_string()))
                            }
                        }
                    }
                }

                LoopState::Verifying => {
                    let verify = self.runner.run(
                        &artifact.code,
                        &artifact.tests,
                        &self.config.language,
                        &self.config.enabled_checks
                    );
                    // A pass cancelled mid-check leaves no record behind.
                    let outcomes = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        outcomes = verify => Some(outcomes),
                    };

                    match outcomes {
                        None => LoopState::Aborted(AbortReason::Cancelled),
                        Some(outcomes) => {
                            for outcome in &outcomes {
                                self.observer.on_outcome_recorded(iteration, outcome);
                            }
                            let passed = all_passed(&outcomes);
                            records.push(IterationRecord::new(iteration, outcomes));

                            if passed {
                                LoopState::Success
                            } else if iteration < max_iterations {
                                LoopState::Repairing
                            } else {
                                LoopState::Failed
                            }
                        }
                    }
                }

                LoopState::Repairing => {
                    let digest = records
                        .last()
                        .map(|record| error_digest(&record.outcomes))
                        .unwrap_or_default();
                    self.observer.on_repair_requested(iteration, &digest);

                    let call = self.generator.repair_code(&artifact.code, &digest);
                    match self.guarded(call, cancel).await {
                        Ok(code) if cancel.is_cancelled() => {
                            artifact.code = code;
                            LoopState::Aborted(AbortReason::Cancelled)
                        }
                        Ok(code) => {
                            artifact.code = code;
                            iteration += 1;
                            self.observer.on_iteration_start(iteration, max_iterations, false);
                            LoopState::Verifying
                        }
                        Err(CallError::Cancelled) => LoopState::Aborted(AbortReason::Cancelled),
                        Err(CallError::Failed(e)) => {
                            LoopState::Aborted(AbortReason::Repair(e.to_string()))
                        }
                    }
                }

                LoopState::Success => {
                    return self.finish(LoopStatus::Success, artifact, records, None);
                }
                LoopState::Failed => {
                    return self.finish(LoopStatus::Failed, artifact, records, None);
                }
                LoopState::Aborted(reason) => {
                    return self.finish(LoopStatus::Aborted, artifact, records, Some(reason));
                }
            };
        }
    }

    /// Result of a run cancelled before the loop started
    pub fn cancelled(&self) -> LoopResult {
        self.finish(LoopStatus::Aborted, CodeArtifact::default(), Vec::new(), Some(AbortReason::Cancelled))
    }

    /// Run a generator call under the generation timeout, giving up early on cancellation
    async fn guarded<T, F>(&self, call: F, cancel: &CancellationToken) -> Result<T, CallError>
        where F: Future<Output = CvResult<T>>
    {
        let timeout = self.config.generation_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CallError::Cancelled),
            result = tokio::time::timeout(timeout, call) => match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(CallError::Failed(e)),
                Err(_) => Err(CallError::Failed(CvError::GenerationTimeout(timeout))),
            },
        }
    }

    fn finish(
        &self,
        status: LoopStatus,
        artifact: CodeArtifact,
        records: Vec<IterationRecord>,
        abort_reason: Option<AbortReason>
    ) -> LoopResult {
        self.observer.on_terminal(status, records.len(), abort_reason.as_ref());
        LoopResult {
            final_status: status,
            iterations: records.len(),
            code: artifact.code,
            tests: artifact.tests,
            metrics: summarize(&records),
            iteration_records: records,
            abort_reason,
        }
    }
}
