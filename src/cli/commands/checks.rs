use anyhow::Result;
use colored::*;

use clarify_verify::implementations::config::PipelineConfig;
use clarify_verify::models::common::Language;
use clarify_verify::verification::runner::CheckRegistry;

use crate::cli::ui;

/// List registered checks and whether their tools are installed
pub async fn execute(config: &PipelineConfig, language: Option<&str>) -> Result<()> {
    let registry = CheckRegistry::with_defaults(&config.verify);

    let languages = match language {
        Some(name) => vec![Language::from(name.to_string())],
        None => registry.languages(),
    };

    ui::print_header("Registered Checks");
    for language in languages {
        println!("{}", language.to_string().bold());
        let checks = registry.checks_for(&language);
        if checks.is_empty() {
            println!("  {}", "no checks registered; every check is reported as skipped".dimmed());
            continue;
        }

        for check in checks {
            let availability = if check.is_available().await {
                "available".green()
            } else {
                "not available".yellow()
            };
            println!("  {:<8} {:<12} {}", check.tool().to_string(), check.name(), availability);
        }
    }

    Ok(())
}
