pub mod run;
pub mod dataset;
pub mod analyze;
pub mod checks;
