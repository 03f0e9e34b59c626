use clap::{ Parser, Subcommand };
use std::path::PathBuf;

pub mod commands;
pub mod ui;

#[derive(Parser)]
#[command(
    name = "clarify-verify",
    about = "Turns natural-language requirements into verified code through a repair loop",
    version,
    author,
    long_about = None
)]
pub struct ClarifyVerifyCli {
    /// Sets the log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    /// Path to configuration file (YAML, or JSON by extension)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline for a single requirement
    Run {
        /// Requirement text
        #[arg(short, long)]
        requirement: String,

        /// Output directory for the result file
        #[arg(short, long)]
        outdir: PathBuf,

        /// Requirement id used in the result file name
        #[arg(long, default_value = "req_001")]
        id: String,

        /// Answer clarification questions at the terminal instead of simulating them
        #[arg(short, long, default_value = "false")]
        interactive: bool,
    },

    /// Run the pipeline for every requirement of a JSON dataset
    Dataset {
        /// Path to the dataset file
        #[arg(short, long)]
        dataset: PathBuf,

        /// Output directory for results.json
        #[arg(short, long)]
        outdir: PathBuf,

        /// Requirements processed concurrently (overrides the config)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Summarize a results file
    Analyze {
        /// Path to results.json or a single result file
        results: PathBuf,

        /// Write the analysis as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered checks per language and probe tool availability
    Checks {
        /// Only show this language
        #[arg(short, long)]
        language: Option<String>,
    },
}
