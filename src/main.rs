use anyhow::{ Context, Result };
use clap::Parser;
use log::{ error, info, warn };
use tokio_util::sync::CancellationToken;

use clarify_verify::implementations::config::PipelineConfig;
use clarify_verify::implementations::llm_client::build_client;

mod cli;
use cli::{ ClarifyVerifyCli, Commands };

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenv::dotenv().ok();

    // Parse the command line arguments
    let cli = ClarifyVerifyCli::parse();

    // Setup logging
    setup_logging(&cli.log_level);

    if let Err(e) = execute(&cli).await {
        error!("Command failed: {:#}", e);
        cli::ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Load the configuration and dispatch the selected command
async fn execute(cli: &ClarifyVerifyCli) -> Result<()> {
    let config = match &cli.config {
        Some(path) =>
            PipelineConfig::from_file(path).with_context(|| {
                format!("Failed to load configuration from {}", path.display())
            })?,
        None => {
            info!("No configuration file given, using defaults");
            PipelineConfig::default()
        }
    };

    // Ctrl-C cancels the running loop(s) between or during checks
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    match &cli.command {
        Commands::Run { requirement, outdir, id, interactive } => {
            let client = build_client(&config)?;
            cli::commands::run::execute(
                config,
                client,
                requirement,
                id,
                outdir,
                *interactive,
                &cancel
            ).await?;
        }

        Commands::Dataset { dataset, outdir, workers } => {
            let client = build_client(&config)?;
            cli::commands::dataset::execute(
                config,
                client,
                dataset,
                outdir,
                *workers,
                &cancel
            ).await?;
        }

        Commands::Analyze { results, output } => {
            cli::commands::analyze::execute(results, output.as_deref())?;
        }

        Commands::Checks { language } => {
            cli::commands::checks::execute(&config, language.as_deref()).await?;
        }
    }

    Ok(())
}

fn setup_logging(log_level: &str) {
    // Set up the logger based on the log level
    let level = match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::new().filter_level(level).init();

    info!("Logger initialized with level: {}", log_level);
}
