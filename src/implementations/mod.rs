pub mod config;
pub mod checks;
pub mod llm_client;
pub mod extractor;
pub mod prompt;
pub mod code_generator;
pub mod clarifier;
pub mod diagram;
pub mod log_observer;

pub use code_generator::LlmCodeGenerator;
pub use clarifier::{ AnswerSource, Clarifier };
pub use diagram::DiagramGenerator;
pub use extractor::FencedBlockExtractor;
pub use llm_client::{ build_client, MockLlmClient, OllamaClient, OpenAiClient };
pub use log_observer::LogObserver;
