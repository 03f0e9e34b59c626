use std::sync::Arc;

use log::debug;

use crate::errors::{ CvError, CvResult };
use crate::implementations::prompt::fill;
use crate::models::clarification::DesignDiagram;
use crate::traits::llm_client::LlmClient;

const SEQUENCE_TEMPLATE: &str =
    r#"Based on the final requirement, write a PlantUML sequence diagram showing:
- the main flow of events
- the main actors and components
- the messages exchanged between them
- short notes on invariants and preconditions where relevant

Final requirement:
"""{{requirement}}"""

Response format:
```plantuml
@startuml
[PlantUML code]
@enduml
```

Add a short description of the diagram after the code."#;

const START: &str = "@startuml";
const END: &str = "@enduml";
const DEFAULT_DESCRIPTION: &str = "Generated diagram.";

/// Produces PlantUML design diagrams used as generation hints
pub struct DiagramGenerator {
    client: Arc<dyn LlmClient>,
}

impl DiagramGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn sequence_diagram(&self, requirement: &str) -> CvResult<DesignDiagram> {
        let prompt = fill(SEQUENCE_TEMPLATE, &[("requirement", requirement)]);
        let response = self.client.generate(&prompt).await?;
        debug!("Diagram response length: {} characters", response.len());
        parse_diagram("sequence", &response)
    }
}

/// Pull the `@startuml ... @enduml` block and the prose after it.
/// The markers are kept so the code renders as is.
pub fn parse_diagram(diagram_type: &str, response: &str) -> CvResult<DesignDiagram> {
    let start = response
        .find(START)
        .ok_or_else(|| CvError::ExtractionError("no @startuml block in diagram response".to_string()))?;
    let end = response[start..]
        .find(END)
        .map(|offset| start + offset + END.len())
        .unwrap_or(response.len());

    let plantuml_code = response[start..end].trim().to_string();
    let description = response[end..].replace("```", "").trim().to_string();

    Ok(DesignDiagram {
        diagram_type: diagram_type.to_string(),
        plantuml_code,
        description: if description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description
        },
    })
}
