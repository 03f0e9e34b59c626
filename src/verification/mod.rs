pub mod aggregator;
pub mod runner;

pub use aggregator::{ all_passed, error_digest };
pub use runner::{ CheckRegistry, VerificationRunner };
