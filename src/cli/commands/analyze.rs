use anyhow::{ anyhow, Result };
use std::path::Path;

use clarify_verify::metrics::analyze;
use clarify_verify::storage::{ load_results, save_report };

use crate::cli::ui;

const MAX_LISTED_IDS: usize = 10;

/// Results analysis command
pub fn execute(results_path: &Path, output: Option<&Path>) -> Result<()> {
    let results = load_results(results_path).map_err(|e|
        anyhow!("Failed to read results {}: {}", results_path.display(), e)
    )?;
    let analysis = analyze(&results);
    let summary = &analysis.summary;

    ui::print_header("Results Analysis");
    ui::print_result("Total requirements", &summary.total_requirements.to_string());
    ui::print_result("Pass rate (Pass@1)", &ui::format_percent(summary.pass_rate));
    ui::print_result("Average iterations", &format!("{:.2}", summary.average_iterations));
    ui::print_result("Test pass rate", &ui::format_percent(summary.test_pass_rate));
    ui::print_result("Linter pass rate", &ui::format_percent(summary.linter_pass_rate));

    let coverage = &summary.verification_coverage;
    println!("\nVerification coverage:");
    println!("  Total:    {}", coverage.total);
    println!("  Passed:   {}", coverage.passed);
    println!("  Coverage: {}", ui::format_percent(coverage.coverage));

    println!();
    ui::print_result("Failed cases", &analysis.failed_cases.to_string());
    if !analysis.failed_case_ids.is_empty() {
        let shown: Vec<&str> = analysis.failed_case_ids
            .iter()
            .take(MAX_LISTED_IDS)
            .map(String::as_str)
            .collect();
        ui::print_result("IDs", &shown.join(", "));
        if analysis.failed_case_ids.len() > MAX_LISTED_IDS {
            println!("... and {} more", analysis.failed_case_ids.len() - MAX_LISTED_IDS);
        }
    }

    if let Some(output) = output {
        save_report(&analysis, output)?;
        ui::print_success(&format!("Analysis saved to {}", output.display()));
    }

    Ok(())
}
