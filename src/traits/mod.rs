pub mod code_generator;
pub mod verification_engine;
pub mod llm_client;
pub mod response_extractor;
pub mod loop_observer;

// Re-export traits
pub use code_generator::CodeGenerator;
pub use verification_engine::{ Check, CheckRequest };
pub use llm_client::LlmClient;
pub use response_extractor::ResponseExtractor;
pub use loop_observer::{ LoopObserver, NoopObserver };
