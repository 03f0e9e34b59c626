use std::sync::Arc;

use async_trait::async_trait;
use log::{ debug, info };

use crate::errors::CvResult;
use crate::implementations::extractor::FencedBlockExtractor;
use crate::implementations::prompt::fill;
use crate::models::artifact::CodeArtifact;
use crate::models::common::Language;
use crate::traits::code_generator::CodeGenerator;
use crate::traits::llm_client::LlmClient;
use crate::traits::response_extractor::ResponseExtractor;

const GENERATE_TEMPLATE: &str =
    r#"You are an experienced developer. Implement the function(s) needed for the final requirement below.

Final requirement:
"""{{requirement}}"""
{{design}}
Instructions:
1. Comment the code where it helps the reader
2. Write complete unit tests ({{test_framework}})
3. Use only the standard library of the language
4. Handle edge cases and errors
5. Follow good programming practice

Response format:
```{{language}}
[implementation code]
```

```{{language}} tests
[unit tests]
```

[Short explanation of the code]"#;

const REPAIR_TEMPLATE: &str =
    r#"The following test/verification failed:
{{digest}}

Fix the code below. Explain the cause and the change briefly, then give the complete corrected code in a single block.

Current code:
```{{language}}
{{code}}
```

Corrected code:"#;

/// [`CodeGenerator`] backed by an LLM and a response extractor
pub struct LlmCodeGenerator {
    client: Arc<dyn LlmClient>,
    extractor: Box<dyn ResponseExtractor>,
    language: Language,
}

impl LlmCodeGenerator {
    pub fn new(client: Arc<dyn LlmClient>, language: Language) -> Self {
        Self {
            client,
            extractor: Box::new(FencedBlockExtractor),
            language,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ResponseExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    fn test_framework(&self) -> &'static str {
        match self.language {
            Language::Python => "pytest",
            Language::JavaScript | Language::TypeScript => "jest",
            Language::Java => "JUnit",
            Language::Rust => "#[test] functions",
            Language::Go => "the testing package",
            _ => "the language's standard unit test framework",
        }
    }

    pub(crate) fn generation_prompt(&self, requirement: &str, design_hint: Option<&str>) -> String {
        let design = match design_hint {
            Some(plantuml) if !plantuml.trim().is_empty() =>
                format!("\nReference design (PlantUML):\n```plantuml\n{}\n```\n", plantuml.trim()),
            _ => String::new(),
        };
        fill(
            GENERATE_TEMPLATE,
            &[
                ("requirement", requirement),
                ("design", &design),
                ("test_framework", self.test_framework()),
                ("language", self.language.as_str()),
            ]
        )
    }

    pub(crate) fn repair_prompt(&self, code: &str, error_digest: &str) -> String {
        fill(
            REPAIR_TEMPLATE,
            &[
                ("digest", error_digest),
                ("code", code),
                ("language", self.language.as_str()),
            ]
        )
    }
}

#[async_trait]
impl CodeGenerator for LlmCodeGenerator {
    async fn generate_code(
        &self,
        requirement: &str,
        design_hint: Option<&str>
    ) -> CvResult<CodeArtifact> {
        info!("Generating {} code and tests with {}", self.language, self.client.describe());
        let response = self.client.generate(&self.generation_prompt(requirement, design_hint)).await?;
        debug!("Generation response length: {} characters", response.len());
        self.extractor.extract_artifact(&response)
    }

    async fn repair_code(&self, code: &str, error_digest: &str) -> CvResult<String> {
        info!("Repairing code based on verification errors");
        let response = self.client.generate(&self.repair_prompt(code, error_digest)).await?;
        self.extractor.extract_code(&response)
    }
}
