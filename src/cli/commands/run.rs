use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use clarify_verify::implementations::config::PipelineConfig;
use clarify_verify::pipeline::{ AnswerMode, Pipeline };
use clarify_verify::storage::save_result;
use clarify_verify::traits::llm_client::LlmClient;
use tokio_util::sync::CancellationToken;

use crate::cli::ui;

/// Single requirement command
pub async fn execute(
    config: PipelineConfig,
    client: Arc<dyn LlmClient>,
    requirement: &str,
    requirement_id: &str,
    outdir: &Path,
    interactive: bool,
    cancel: &CancellationToken
) -> Result<()> {
    ui::print_header("Clarify-Verify");
    ui::print_result("Requirement", requirement_id);
    ui::print_text(requirement);
    ui::print_result("Backend", &client.describe());
    ui::print_result("Max iterations", &config.max_iterations.to_string());

    let answers = if interactive {
        AnswerMode::External(Arc::new(ui::TerminalAnswers))
    } else {
        AnswerMode::Simulated
    };

    // The spinner would garble dialoguer prompts, so it starts after clarification.
    let spinner = if interactive {
        None
    } else {
        Some(ui::spinner_with_message("Clarifying requirement..."))
    };

    let mut pipeline = Pipeline::new(config, client);
    if let Some(spinner) = &spinner {
        pipeline = pipeline.with_observer(Arc::new(ui::SpinnerObserver::new(spinner.clone())));
    }

    let result = pipeline.run(requirement, requirement_id, &answers, cancel).await;
    if let Some(spinner) = spinner {
        if !spinner.is_finished() {
            spinner.finish_and_clear();
        }
    }

    if !result.clarification_questions.is_empty() {
        ui::print_header("Refined Requirement");
        ui::print_text(&result.refined_requirement);
    }

    ui::print_header("Verification");
    for record in &result.verification_results {
        println!("Iteration {}", record.iteration);
        for outcome in &record.outcomes {
            ui::print_outcome(outcome);
        }
    }

    ui::print_header("Generated Code");
    ui::print_code("Implementation", &result.generated_code);
    ui::print_code("Tests", &result.generated_tests);

    print!("\nFinal status: ");
    ui::print_loop_status(result.final_status, result.abort_reason.as_ref());
    ui::print_result("Iterations", &result.iterations.to_string());

    let path = save_result(&result, outdir)?;
    ui::print_success(&format!("Result saved to {}", path.display()));

    Ok(())
}
