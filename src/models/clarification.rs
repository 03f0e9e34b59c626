use serde::{ Deserialize, Serialize };

/// Question asked to disambiguate a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationQuestion {
    pub question: String,
    /// "Required" or "Desirable"
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub reason: String,
}

fn default_priority() -> String {
    "Desirable".to_string()
}

impl ClarificationQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            priority: default_priority(),
            reason: String::new(),
        }
    }
}

/// A question paired with the answer used to refine the requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationAnswer {
    pub question: String,
    pub answer: String,
}

/// Design artifact handed to the generator as a hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDiagram {
    /// "sequence", "class", ...
    #[serde(rename = "type")]
    pub diagram_type: String,
    pub plantuml_code: String,
    pub description: String,
}
