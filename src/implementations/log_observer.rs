use log::{ debug, info, warn };

use crate::models::artifact::{ AbortReason, LoopStatus };
use crate::models::verification::{ VerificationOutcome, VerificationStatus };
use crate::traits::loop_observer::LoopObserver;

/// Observer that forwards loop events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl LoopObserver for LogObserver {
    fn on_iteration_start(&self, iteration: usize, max_iterations: usize, generating: bool) {
        if generating {
            info!("Iteration {}/{}: generating code and tests", iteration, max_iterations);
        } else {
            info!("Iteration {}/{}: verifying repaired code", iteration, max_iterations);
        }
    }

    fn on_outcome_recorded(&self, iteration: usize, outcome: &VerificationOutcome) {
        match outcome.status {
            VerificationStatus::Pass | VerificationStatus::Skipped => {
                debug!("Iteration {}: {} -> {}", iteration, outcome.tool, outcome.status);
            }
            VerificationStatus::Fail | VerificationStatus::Error => {
                info!(
                    "Iteration {}: {} -> {} ({} errors)",
                    iteration,
                    outcome.tool,
                    outcome.status,
                    outcome.errors.len()
                );
            }
        }
    }

    fn on_repair_requested(&self, iteration: usize, error_digest: &str) {
        info!("Iteration {}: requesting repair", iteration);
        debug!("Error digest:\n{}", error_digest);
    }

    fn on_terminal(&self, status: LoopStatus, iterations: usize, reason: Option<&AbortReason>) {
        match reason {
            Some(reason) => warn!("Loop {} after {} iterations: {}", status, iterations, reason),
            None => info!("Loop {} after {} iterations", status, iterations),
        }
    }
}
