use crate::models::artifact::{ AbortReason, LoopStatus };
use crate::models::verification::VerificationOutcome;

/// Callbacks invoked by the repair loop at its transition points
///
/// All methods default to no-ops so implementors only override what they need.
pub trait LoopObserver: Send + Sync {
    /// A verify pass is about to start. `generating` is true when the pass
    /// begins with a full generation rather than a repaired artifact.
    fn on_iteration_start(&self, _iteration: usize, _max_iterations: usize, _generating: bool) {}

    /// An outcome of the current pass has been recorded
    fn on_outcome_recorded(&self, _iteration: usize, _outcome: &VerificationOutcome) {}

    /// The loop is asking the generator to repair the code
    fn on_repair_requested(&self, _iteration: usize, _error_digest: &str) {}

    /// The loop reached a terminal state
    fn on_terminal(&self, _status: LoopStatus, _iterations: usize, _reason: Option<&AbortReason>) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl LoopObserver for NoopObserver {}
