use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use log::debug;

use crate::config::RunnerConfig;
use crate::implementations::checks::{ FormalPlaceholder, LinterCheck, PytestCheck };
use crate::implementations::config::VerifyConfig;
use crate::models::common::{ CheckTool, Language };
use crate::models::verification::VerificationOutcome;
use crate::traits::verification_engine::{ Check, CheckRequest };

/// Maps a language to the checks available for it
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: HashMap<(Language, CheckTool), Arc<dyn Check>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Python gets pytest, pylint (flake8 fallback) and the formal placeholder.
    /// Every other language starts empty and is reported as skipped.
    pub fn with_defaults(verify: &VerifyConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Language::Python, Arc::new(PytestCheck::new(verify.python.clone())));
        registry.register(Language::Python, Arc::new(LinterCheck::python_default()));
        registry.register(Language::Python, Arc::new(FormalPlaceholder));
        registry
    }

    /// Register `check` for `language`, replacing any check in the same slot
    pub fn register(&mut self, language: Language, check: Arc<dyn Check>) -> Option<Arc<dyn Check>> {
        self.checks.insert((language, check.tool()), check)
    }

    pub fn get(&self, language: &Language, tool: CheckTool) -> Option<&Arc<dyn Check>> {
        self.checks.get(&(language.clone(), tool))
    }

    /// Languages with at least one registered check, sorted by name
    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.checks
            .keys()
            .map(|(language, _)| language.clone())
            .collect();
        languages.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        languages.dedup();
        languages
    }

    /// Registered checks for `language` in report order
    pub fn checks_for(&self, language: &Language) -> Vec<Arc<dyn Check>> {
        CheckTool::ORDER.iter()
            .filter_map(|tool| self.get(language, *tool).cloned())
            .collect()
    }
}

/// Runs the enabled checks of one verify pass
pub struct VerificationRunner {
    registry: CheckRegistry,
    config: RunnerConfig,
}

impl VerificationRunner {
    pub fn new(registry: CheckRegistry, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// One outcome per enabled check, ordered tests, linter, formal.
    ///
    /// Disabled checks are omitted. An enabled check with no implementation
    /// for `language` is reported as `skipped`. The order is the same whether
    /// the checks run sequentially or concurrently.
    pub async fn run(
        &self,
        code: &str,
        tests: &str,
        language: &Language,
        enabled_checks: &[CheckTool]
    ) -> Vec<VerificationOutcome> {
        let planned: Vec<CheckTool> = CheckTool::ORDER.iter()
            .copied()
            .filter(|tool| enabled_checks.contains(tool))
            .collect();

        if self.config.parallel {
            join_all(planned.iter().map(|tool| self.run_one(*tool, code, tests, language))).await
        } else {
            let mut outcomes = Vec::with_capacity(planned.len());
            for tool in planned {
                outcomes.push(self.run_one(tool, code, tests, language).await);
            }
            outcomes
        }
    }

    async fn run_one(
        &self,
        tool: CheckTool,
        code: &str,
        tests: &str,
        language: &Language
    ) -> VerificationOutcome {
        let Some(check) = self.registry.get(language, tool) else {
            return VerificationOutcome::skipped(tool, format!("No {} check available for {}", tool, language));
        };

        let timeout = self.config.timeout_for(tool);
        let request = CheckRequest {
            code,
            tests,
            language,
            timeout,
        };

        debug!("Running {} check ({})", tool, check.name());
        // Checks enforce their own bound; this one catches checks that do not.
        match tokio::time::timeout(timeout + self.config.grace, check.run_check(request)).await {
            Ok(outcome) => outcome,
            Err(_) => VerificationOutcome::timeout(tool),
        }
    }
}
