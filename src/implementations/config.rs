use serde::{ Deserialize, Serialize };
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON config file: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Missing required API key: {0}")]
    MissingApiKey(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Backend provider: openai, ollama or mock
    pub provider: String,

    /// Model name passed to the provider
    pub name: String,

    /// Override for the provider endpoint
    pub api_endpoint: Option<String>,

    /// API key; falls back to the provider's environment variable
    pub api_key: Option<String>,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens for API calls
    pub max_tokens: usize,

    /// HTTP timeout for a single API request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            name: "gpt-4o-mini".to_string(),
            api_endpoint: None,
            api_key: None,
            temperature: 0.0,
            max_tokens: 4096,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct VerifyConfig {
    pub run_tests: bool,
    pub run_linter: bool,
    pub run_formal: bool,

    /// Run the checks of one pass concurrently
    pub parallel: bool,

    pub tests_timeout_secs: u64,
    pub linter_timeout_secs: u64,
    pub formal_timeout_secs: u64,

    /// Python interpreter used to run pytest
    pub python: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            run_tests: true,
            run_linter: true,
            run_formal: false,
            parallel: false,
            tests_timeout_secs: 30,
            linter_timeout_secs: 10,
            formal_timeout_secs: 60,
            python: "python".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: ModelConfig,

    /// Run the clarification stage before generation
    pub use_clarification: bool,

    /// Generate a sequence diagram as a design hint
    pub generate_uml: bool,

    pub clarifier_max_questions: usize,

    /// Upper bound on verify passes per requirement
    pub max_iterations: usize,

    /// Target implementation language
    pub language: String,

    pub verify: VerifyConfig,

    /// Bound on a single generate or repair call, in seconds
    pub generation_timeout_secs: u64,

    /// Requirements processed concurrently in dataset mode
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            use_clarification: true,
            generate_uml: true,
            clarifier_max_questions: 7,
            max_iterations: 3,
            language: "python".to_string(),
            verify: VerifyConfig::default(),
            generation_timeout_secs: 300,
            workers: 4,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file, or JSON when the extension is `.json`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config: PipelineConfig = if is_json {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot drive a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue("workers must be at least 1".to_string()));
        }
        if self.generation_timeout_secs == 0 {
            return Err(
                ConfigError::InvalidValue("generation_timeout_secs must be positive".to_string())
            );
        }
        Ok(())
    }

    /// Get the API key, checking the environment if it is not in the config
    pub fn get_api_key(&self) -> Result<String, ConfigError> {
        use log::debug;

        if let Some(api_key) = &self.model.api_key {
            debug!("Using API key from config");
            return Ok(api_key.clone());
        }

        let env_var_name = match self.model.provider.to_lowercase().as_str() {
            "openai" => "OPENAI_API_KEY",
            other => {
                return Err(
                    ConfigError::MissingApiKey(format!("provider {} does not use an API key", other))
                );
            }
        };

        std::env::var(env_var_name).map_err(|_| ConfigError::MissingApiKey(env_var_name.to_string()))
    }
}
