use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;

/// Target implementation language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Rust,
    Go,
    C,
    CPlusPlus,
    Custom(String),
}

impl Language {
    /// Canonical lowercase name used in configs and result files
    pub fn as_str(&self) -> &str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::C => "c",
            Language::CPlusPlus => "cpp",
            Language::Custom(name) => name,
        }
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "java" => Language::Java,
            "rust" | "rs" => Language::Rust,
            "go" => Language::Go,
            "c" => Language::C,
            "c++" | "cpp" => Language::CPlusPlus,
            other => Language::Custom(other.to_string()),
        })
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(language) => language,
            Err(never) => match never {},
        }
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verification techniques applied to a generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckTool {
    /// Unit test execution
    Tests,
    /// Static analysis
    Linter,
    /// Formal verification
    Formal,
}

impl CheckTool {
    /// The fixed order in which checks are reported
    pub const ORDER: [CheckTool; 3] = [CheckTool::Tests, CheckTool::Linter, CheckTool::Formal];

    pub fn name(&self) -> &'static str {
        match self {
            CheckTool::Tests => "tests",
            CheckTool::Linter => "linter",
            CheckTool::Formal => "formal",
        }
    }
}

impl fmt::Display for CheckTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
