//! Scripted collaborators shared by the cross-module tests.

use std::collections::{ HashMap, VecDeque };
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };
use std::time::Duration;

use async_trait::async_trait;
use log::info;

use crate::config::RunnerConfig;
use crate::errors::{ CvError, CvResult };
use crate::models::artifact::{ AbortReason, CodeArtifact, LoopStatus };
use crate::models::common::{ CheckTool, Language };
use crate::models::verification::VerificationOutcome;
use crate::traits::code_generator::CodeGenerator;
use crate::traits::llm_client::LlmClient;
use crate::traits::loop_observer::LoopObserver;
use crate::traits::verification_engine::{ Check, CheckRequest };
use crate::verification::runner::{ CheckRegistry, VerificationRunner };

// Initialize logging once; later calls are no-ops
pub fn setup() {
    if env_logger::builder().is_test(true).try_init().is_ok() {
        info!("Logger initialized");
    }
}

/// Generator replaying queued replies; an exhausted queue is a failure
#[derive(Default)]
pub struct ScriptedGenerator {
    generations: Mutex<VecDeque<CvResult<CodeArtifact>>>,
    repairs: Mutex<VecDeque<CvResult<String>>>,
    generate_delay: Option<Duration>,
    pub generate_calls: AtomicUsize,
    pub repair_calls: AtomicUsize,
    pub repair_inputs: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new(generation: CvResult<CodeArtifact>) -> Self {
        let generator = Self::default();
        generator.generations.lock().unwrap().push_back(generation);
        generator
    }

    pub fn artifact(code: &str, tests: &str) -> Self {
        Self::new(Ok(CodeArtifact::new(code, tests)))
    }

    pub fn with_repair(self, repair: CvResult<String>) -> Self {
        self.repairs.lock().unwrap().push_back(repair);
        self
    }

    pub fn with_generate_delay(mut self, delay: Duration) -> Self {
        self.generate_delay = Some(delay);
        self
    }

    pub fn generate_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn repair_count(&self) -> usize {
        self.repair_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeGenerator for ScriptedGenerator {
    async fn generate_code(
        &self,
        _requirement: &str,
        _design_hint: Option<&str>
    ) -> CvResult<CodeArtifact> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.generate_delay {
            tokio::time::sleep(delay).await;
        }
        self.generations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CvError::GenerationFailure("no scripted generation".into())))
    }

    async fn repair_code(&self, code: &str, error_digest: &str) -> CvResult<String> {
        self.repair_calls.fetch_add(1, Ordering::SeqCst);
        self.repair_inputs.lock().unwrap().push((code.to_string(), error_digest.to_string()));
        self.repairs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CvError::GenerationFailure("no scripted repair".into())))
    }
}

/// Check replaying queued outcomes; passes once the queue is empty
pub struct ScriptedCheck {
    tool: CheckTool,
    outcomes: Mutex<VecDeque<VerificationOutcome>>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedCheck {
    pub fn new(tool: CheckTool, outcomes: Vec<VerificationOutcome>) -> Self {
        Self {
            tool,
            outcomes: Mutex::new(outcomes.into()),
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn passing(tool: CheckTool) -> Self {
        Self::new(tool, Vec::new())
    }

    /// Fails `times` passes with `error`, then passes
    pub fn failing(tool: CheckTool, times: usize, error: &str) -> Self {
        let outcomes = (0..times)
            .map(|_| VerificationOutcome::fail(tool, "", vec![error.to_string()]))
            .collect();
        Self::new(tool, outcomes)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Check for ScriptedCheck {
    fn tool(&self) -> CheckTool {
        self.tool
    }

    fn name(&self) -> &str {
        "scripted"
    }

    async fn run_check(&self, request: CheckRequest<'_>) -> VerificationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((request.code.to_string(), request.tests.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| VerificationOutcome::pass(self.tool, "ok"))
    }
}

/// Check that never completes
pub struct HangingCheck(pub CheckTool);

#[async_trait]
impl Check for HangingCheck {
    fn tool(&self) -> CheckTool {
        self.0
    }

    fn name(&self) -> &str {
        "hanging"
    }

    async fn run_check(&self, _request: CheckRequest<'_>) -> VerificationOutcome {
        std::future::pending::<()>().await;
        VerificationOutcome::pass(self.0, "unreachable")
    }
}

/// Model backend whose calls never complete
#[derive(Default)]
pub struct StalledLlmClient {
    pub calls: AtomicUsize,
}

impl StalledLlmClient {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for StalledLlmClient {
    async fn generate(&self, _prompt: &str) -> CvResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        Ok(String::new())
    }

    fn describe(&self) -> String {
        "stalled".to_string()
    }
}

/// Observer recording every event as a short string
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl LoopObserver for RecordingObserver {
    fn on_iteration_start(&self, iteration: usize, _max_iterations: usize, generating: bool) {
        let kind = if generating { "generate" } else { "verify" };
        self.events.lock().unwrap().push(format!("start:{}:{}", iteration, kind));
    }

    fn on_outcome_recorded(&self, iteration: usize, outcome: &VerificationOutcome) {
        self.events.lock().unwrap().push(format!("outcome:{}:{}:{}", iteration, outcome.tool, outcome.status));
    }

    fn on_repair_requested(&self, iteration: usize, _error_digest: &str) {
        self.events.lock().unwrap().push(format!("repair:{}", iteration));
    }

    fn on_terminal(&self, status: LoopStatus, iterations: usize, reason: Option<&AbortReason>) {
        let reason = reason.map(|r| r.to_string()).unwrap_or_default();
        self.events.lock().unwrap().push(format!("terminal:{}:{}:{}", status, iterations, reason));
    }
}

/// Runner config with short bounds so timeout tests finish quickly
pub fn fast_runner_config(parallel: bool) -> RunnerConfig {
    let mut timeouts = HashMap::new();
    timeouts.insert(CheckTool::Tests, Duration::from_millis(200));
    timeouts.insert(CheckTool::Linter, Duration::from_millis(200));
    timeouts.insert(CheckTool::Formal, Duration::from_millis(200));
    RunnerConfig {
        parallel,
        timeouts,
        grace: Duration::from_millis(50),
    }
}

/// Runner with `checks` registered for Python
pub fn python_runner(checks: Vec<Arc<dyn Check>>, parallel: bool) -> Arc<VerificationRunner> {
    let mut registry = CheckRegistry::new();
    for check in checks {
        registry.register(Language::Python, check);
    }
    Arc::new(VerificationRunner::new(registry, fast_runner_config(parallel)))
}
