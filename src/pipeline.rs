//! Clarify → design → generate/verify/repair, for one requirement or a dataset.

use std::future::Future;
use std::sync::Arc;

use chrono::{ DateTime, Utc };
use futures::stream::{ self, StreamExt };
use log::{ error, info, warn };
use tokio_util::sync::CancellationToken;

use crate::config::{ LoopConfig, RunnerConfig };
use crate::errors::{ CvError, CvResult };
use crate::implementations::clarifier::{ AnswerSource, Clarifier };
use crate::implementations::code_generator::LlmCodeGenerator;
use crate::implementations::config::PipelineConfig;
use crate::implementations::diagram::DiagramGenerator;
use crate::models::clarification::{ ClarificationQuestion, DesignDiagram };
use crate::models::pipeline::{ DatasetItem, PipelineResult };
use crate::repair_loop::RepairLoop;
use crate::storage::default_requirement_id;
use crate::traits::code_generator::CodeGenerator;
use crate::traits::llm_client::LlmClient;
use crate::traits::loop_observer::LoopObserver;
use crate::verification::runner::{ CheckRegistry, VerificationRunner };

/// How clarification questions get answered
#[derive(Clone)]
pub enum AnswerMode {
    /// The model answers its own questions
    Simulated,
    /// Answers come from outside, typically the terminal
    External(Arc<dyn AnswerSource>),
}

/// Why a pre-loop stage did not produce a value
enum StageError {
    Failed(CvError),
    Cancelled,
}

impl From<CvError> for StageError {
    fn from(error: CvError) -> Self {
        StageError::Failed(error)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    clarifier: Clarifier,
    diagrams: DiagramGenerator,
    repair_loop: RepairLoop,
}

impl Pipeline {
    /// Wire the default generator and the default check registry around `client`
    pub fn new(config: PipelineConfig, client: Arc<dyn LlmClient>) -> Self {
        let loop_config = LoopConfig::from(&config);
        let generator: Arc<dyn CodeGenerator> = Arc::new(
            LlmCodeGenerator::new(client.clone(), loop_config.language.clone())
        );
        let runner = Arc::new(
            VerificationRunner::new(
                CheckRegistry::with_defaults(&config.verify),
                RunnerConfig::from(&config)
            )
        );
        Self::from_parts(config, client, generator, runner)
    }

    pub fn from_parts(
        config: PipelineConfig,
        client: Arc<dyn LlmClient>,
        generator: Arc<dyn CodeGenerator>,
        runner: Arc<VerificationRunner>
    ) -> Self {
        let repair_loop = RepairLoop::new(generator, runner, LoopConfig::from(&config));
        Self {
            clarifier: Clarifier::new(client.clone(), config.clarifier_max_questions),
            diagrams: DiagramGenerator::new(client),
            repair_loop,
            config,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LoopObserver>) -> Self {
        self.repair_loop = self.repair_loop.with_observer(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage for one requirement.
    ///
    /// Clarification and diagram failures are logged and the run continues
    /// with the original requirement and no design hint. Each model call of
    /// those stages is bounded by the generation timeout, and cancellation
    /// ends the run as aborted without starting the loop.
    pub async fn run(
        &self,
        requirement: &str,
        requirement_id: &str,
        answers: &AnswerMode,
        cancel: &CancellationToken
    ) -> PipelineResult {
        let started_at = Utc::now();
        if cancel.is_cancelled() {
            return self.aborted(requirement_id, requirement, requirement.to_string(), Vec::new(), Vec::new(), started_at);
        }
        info!("Processing requirement {}", requirement_id);

        let (refined, questions) = if self.config.use_clarification {
            match self.clarify(requirement, answers, cancel).await {
                Ok(outcome) => outcome,
                Err(StageError::Cancelled) => {
                    return self.aborted(requirement_id, requirement, requirement.to_string(), Vec::new(), Vec::new(), started_at);
                }
                Err(StageError::Failed(e)) => {
                    if e.is_generation_failure() {
                        warn!("Clarification failed for {}: {}", requirement_id, e);
                    } else {
                        error!("Clarification error for {}: {}", requirement_id, e);
                    }
                    (requirement.to_string(), Vec::new())
                }
            }
        } else {
            (requirement.to_string(), Vec::new())
        };

        let mut diagrams: Vec<DesignDiagram> = Vec::new();
        if self.config.generate_uml {
            info!("Generating sequence diagram");
            let diagram = self.stage(self.diagrams.sequence_diagram(&refined), cancel).await;
            match diagram {
                Ok(diagram) => diagrams.push(diagram),
                Err(StageError::Cancelled) => {
                    return self.aborted(requirement_id, requirement, refined, questions, diagrams, started_at);
                }
                Err(StageError::Failed(e)) => error!("Error generating diagram for {}: {}", requirement_id, e),
            }
        }

        let design_hint = diagrams.first().map(|d| d.plantuml_code.as_str());
        let loop_result = self.repair_loop.run(&refined, design_hint, cancel).await;

        info!(
            "Requirement {} finished with status={} after {} iteration(s)",
            requirement_id,
            loop_result.final_status,
            loop_result.iterations
        );

        PipelineResult::from_loop(
            requirement_id,
            requirement,
            refined,
            questions,
            diagrams,
            loop_result,
            started_at
        )
    }

    async fn clarify(
        &self,
        requirement: &str,
        answers: &AnswerMode,
        cancel: &CancellationToken
    ) -> Result<(String, Vec<ClarificationQuestion>), StageError> {
        info!("Starting clarification stage");
        if !self.stage(self.clarifier.detect_ambiguity(requirement), cancel).await? {
            info!("Requirement is clear, skipping questions");
            return Ok((requirement.to_string(), Vec::new()));
        }

        let questions = self.stage(self.clarifier.generate_questions(requirement), cancel).await?;
        let answers = match answers {
            AnswerMode::Simulated => {
                self.stage(self.clarifier.simulate_answers(requirement, &questions), cancel).await?
            }
            // Terminal input is not bounded by the generation timeout
            AnswerMode::External(source) => self.clarifier.collect_answers(&questions, source.as_ref())?,
        };
        if cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }
        let refined = self.stage(self.clarifier.refine_requirement(requirement, &answers), cancel).await?;
        Ok((refined, questions))
    }

    /// Run one model call of a pre-loop stage under the generation timeout
    async fn stage<T, F>(&self, call: F, cancel: &CancellationToken) -> Result<T, StageError>
        where F: Future<Output = CvResult<T>>
    {
        let timeout = self.repair_loop.config().generation_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StageError::Cancelled),
            result = tokio::time::timeout(timeout, call) => match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(StageError::Failed(e)),
                Err(_) => Err(StageError::Failed(CvError::GenerationTimeout(timeout))),
            },
        }
    }

    fn aborted(
        &self,
        requirement_id: &str,
        requirement: &str,
        refined: String,
        questions: Vec<ClarificationQuestion>,
        diagrams: Vec<DesignDiagram>,
        started_at: DateTime<Utc>
    ) -> PipelineResult {
        warn!("Requirement {} cancelled before code generation", requirement_id);
        let loop_result = self.repair_loop.cancelled();
        PipelineResult::from_loop(requirement_id, requirement, refined, questions, diagrams, loop_result, started_at)
    }

    /// Process a dataset with up to `workers` requirements in flight.
    ///
    /// Answers are always simulated. Results come back in input order.
    pub async fn run_dataset(
        &self,
        items: &[DatasetItem],
        workers: usize,
        cancel: &CancellationToken
    ) -> Vec<PipelineResult> {
        self.run_dataset_with(items, workers, cancel, |_| {}).await
    }

    /// Like [`Pipeline::run_dataset`], calling `on_complete` as each result is yielded
    pub async fn run_dataset_with<F>(
        &self,
        items: &[DatasetItem],
        workers: usize,
        cancel: &CancellationToken,
        on_complete: F
    ) -> Vec<PipelineResult>
        where F: Fn(&PipelineResult)
    {
        let workers = workers.max(1);
        info!("Processing {} requirements with {} workers", items.len(), workers);

        let answers = AnswerMode::Simulated;
        let answers = &answers;
        stream
            ::iter(items.iter().enumerate())
            .map(|(index, item)| async move {
                let id = item.id.clone().unwrap_or_else(|| default_requirement_id(index));
                self.run(&item.requirement, &id, answers, cancel).await
            })
            .buffered(workers)
            .inspect(|result| on_complete(result))
            .collect().await
    }
}
