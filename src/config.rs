use std::collections::HashMap;
use std::time::Duration;

use crate::implementations::config::PipelineConfig;
use crate::models::common::{ CheckTool, Language };

/// Settings for one repair loop run
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Maximum number of verify passes; zero means the loop never runs
    pub max_iterations: usize,
    pub language: Language,
    /// Checks to run each pass; reported in [`CheckTool::ORDER`]
    pub enabled_checks: Vec<CheckTool>,
    /// Bound on a single generate or repair call
    pub generation_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            language: Language::Python,
            enabled_checks: vec![CheckTool::Tests, CheckTool::Linter],
            generation_timeout: Duration::from_secs(300),
        }
    }
}

/// Settings for the verification runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Run the checks of one pass concurrently
    pub parallel: bool,
    pub timeouts: HashMap<CheckTool, Duration>,
    /// Slack added on top of a check's own bound before the runner gives up on it
    pub grace: Duration,
}

impl RunnerConfig {
    pub fn timeout_for(&self, tool: CheckTool) -> Duration {
        self.timeouts.get(&tool).copied().unwrap_or(Duration::from_secs(30))
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let mut timeouts = HashMap::new();
        timeouts.insert(CheckTool::Tests, Duration::from_secs(30));
        timeouts.insert(CheckTool::Linter, Duration::from_secs(10));
        timeouts.insert(CheckTool::Formal, Duration::from_secs(60));
        Self {
            parallel: false,
            timeouts,
            grace: Duration::from_secs(2),
        }
    }
}

impl From<&PipelineConfig> for LoopConfig {
    fn from(config: &PipelineConfig) -> Self {
        let mut enabled_checks = Vec::new();
        if config.verify.run_tests {
            enabled_checks.push(CheckTool::Tests);
        }
        if config.verify.run_linter {
            enabled_checks.push(CheckTool::Linter);
        }
        if config.verify.run_formal {
            enabled_checks.push(CheckTool::Formal);
        }

        Self {
            max_iterations: config.max_iterations,
            language: Language::from(config.language.clone()),
            enabled_checks,
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
        }
    }
}

impl From<&PipelineConfig> for RunnerConfig {
    fn from(config: &PipelineConfig) -> Self {
        let mut timeouts = HashMap::new();
        timeouts.insert(CheckTool::Tests, Duration::from_secs(config.verify.tests_timeout_secs));
        timeouts.insert(CheckTool::Linter, Duration::from_secs(config.verify.linter_timeout_secs));
        timeouts.insert(CheckTool::Formal, Duration::from_secs(config.verify.formal_timeout_secs));

        Self {
            parallel: config.verify.parallel,
            timeouts,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_checks_follow_verify_flags() {
        let mut config = PipelineConfig::default();
        config.verify.run_linter = false;
        config.verify.run_formal = true;

        let loop_config = LoopConfig::from(&config);
        assert_eq!(loop_config.enabled_checks, vec![CheckTool::Tests, CheckTool::Formal]);
        assert_eq!(loop_config.language, Language::Python);
    }

    #[test]
    fn runner_timeouts_come_from_config() {
        let mut config = PipelineConfig::default();
        config.verify.linter_timeout_secs = 3;

        let runner = RunnerConfig::from(&config);
        assert_eq!(runner.timeout_for(CheckTool::Linter), Duration::from_secs(3));
        assert_eq!(runner.timeout_for(CheckTool::Tests), Duration::from_secs(30));
    }
}
