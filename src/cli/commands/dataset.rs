use anyhow::{ anyhow, Result };
use std::path::Path;
use std::sync::Arc;

use clarify_verify::implementations::config::PipelineConfig;
use clarify_verify::metrics::summarize_dataset;
use clarify_verify::pipeline::Pipeline;
use clarify_verify::storage::{ load_dataset, save_results };
use clarify_verify::traits::llm_client::LlmClient;
use clarify_verify::traits::loop_observer::NoopObserver;
use tokio_util::sync::CancellationToken;

use crate::cli::ui;

/// Dataset command
pub async fn execute(
    config: PipelineConfig,
    client: Arc<dyn LlmClient>,
    dataset_path: &Path,
    outdir: &Path,
    workers: Option<usize>,
    cancel: &CancellationToken
) -> Result<()> {
    ui::print_header("Clarify-Verify Dataset Run");

    let items = load_dataset(dataset_path).map_err(|e|
        anyhow!("Failed to load dataset {}: {}", dataset_path.display(), e)
    )?;
    let workers = workers.unwrap_or(config.workers).max(1);
    ui::print_info(&format!("Loaded {} requirements, {} workers", items.len(), workers));

    let progress = ui::create_progress_bar(items.len() as u64, "Processing requirements");
    // Per-iteration chatter from concurrent loops would interleave; the bar is enough.
    let pipeline = Pipeline::new(config, client).with_observer(Arc::new(NoopObserver));

    let results = pipeline.run_dataset_with(&items, workers, cancel, |result| {
        progress.println(format!("{} -> {}", result.requirement_id, result.final_status));
        progress.inc(1);
    }).await;
    progress.finish_with_message("Done");

    let path = save_results(&results, outdir)?;
    ui::print_success(&format!("{} results saved to {}", results.len(), path.display()));

    let summary = summarize_dataset(&results);
    ui::print_result("Pass rate", &ui::format_percent(summary.pass_rate));
    ui::print_result("Average iterations", &format!("{:.2}", summary.average_iterations));

    if cancel.is_cancelled() {
        ui::print_warning("Run was cancelled; unfinished requirements are marked aborted");
    }

    Ok(())
}
