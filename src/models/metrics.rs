use serde::{ Deserialize, Serialize };

/// Snapshot of the last verify pass of a loop run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub iterations: usize,
    pub tests_passed: bool,
    pub linter_passed: bool,
    pub total_verifications: usize,
    pub passed_verifications: usize,
}

impl Metrics {
    /// True for the value produced from an empty record sequence
    pub fn is_empty(&self) -> bool {
        *self == Metrics::default()
    }
}

/// Share of verifications that passed across a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationCoverage {
    pub total: usize,
    pub passed: usize,
    pub coverage: f64,
}

/// Aggregate statistics over many pipeline results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_requirements: usize,
    /// Fraction of requirements whose loop ended in `success` (Pass@1)
    pub pass_rate: f64,
    pub average_iterations: f64,
    pub test_pass_rate: f64,
    pub linter_pass_rate: f64,
    pub verification_coverage: VerificationCoverage,
}

/// Summary plus the requirement ids split by outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultAnalysis {
    pub summary: DatasetSummary,
    pub failed_cases: usize,
    pub failed_case_ids: Vec<String>,
    pub success_cases: Vec<String>,
}
