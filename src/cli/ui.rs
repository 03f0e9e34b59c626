use colored::*;
use console::Term;
use dialoguer::{ theme::ColorfulTheme, Input };
use indicatif::{ ProgressBar, ProgressStyle };
use std::time::Duration;
use textwrap::wrap;

use clarify_verify::errors::{ CvError, CvResult };
use clarify_verify::implementations::clarifier::AnswerSource;
use clarify_verify::models::artifact::{ AbortReason, LoopStatus };
use clarify_verify::models::clarification::ClarificationQuestion;
use clarify_verify::models::verification::{ VerificationOutcome, VerificationStatus };
use clarify_verify::traits::loop_observer::LoopObserver;

/// UI theme for consistent appearance
pub fn get_theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

fn term_width() -> usize {
    (Term::stdout().size().1 as usize).max(40)
}

/// Print a section header
pub fn print_header(title: &str) {
    let title = format!(" {} ", title);
    println!("\n{}\n", title.bold().white().on_blue());
}

/// Print prose wrapped to the terminal width
pub fn print_text(text: &str) {
    let width = term_width();
    for line in text.lines() {
        for wrapped_line in wrap(line, width.saturating_sub(4)) {
            println!("{}", wrapped_line);
        }
    }
}

/// Print code unwrapped, indented under a label
pub fn print_code(label: &str, code: &str) {
    println!("{}", label.bold());
    if code.trim().is_empty() {
        println!("  {}", "(empty)".dimmed());
        return;
    }
    for line in code.lines() {
        println!("  {}", line);
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "ERROR:".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "WARNING:".yellow().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "SUCCESS:".green().bold(), message);
}

/// Print information
pub fn print_info(message: &str) {
    println!("{} {}", "INFO:".blue().bold(), message);
}

/// Print a formatted result
pub fn print_result(label: &str, value: &str) {
    println!("{}: {}", label.bold(), value);
}

pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Colored one-word rendering of a check status
pub fn status_label(status: VerificationStatus) -> ColoredString {
    match status {
        VerificationStatus::Pass => "✓ pass".green().bold(),
        VerificationStatus::Fail => "✗ fail".red().bold(),
        VerificationStatus::Error => "⚠ error".red(),
        VerificationStatus::Skipped => "- skipped".dimmed(),
    }
}

/// Print one check outcome with its first errors
pub fn print_outcome(outcome: &VerificationOutcome) {
    println!("  {:<8} {}", outcome.tool.to_string(), status_label(outcome.status));
    for error in outcome.errors.iter().take(3) {
        println!("           {}", error.dimmed());
    }
}

/// Print the terminal status of a loop with color
pub fn print_loop_status(status: LoopStatus, reason: Option<&AbortReason>) {
    let text = match reason {
        Some(reason) => format!("{} ({})", status, reason),
        None => status.to_string(),
    };
    match status {
        LoopStatus::Success => println!("{}", text.green().bold()),
        LoopStatus::Failed => println!("{}", text.red().bold()),
        LoopStatus::Unknown => println!("{}", text.yellow().bold()),
        LoopStatus::Aborted => println!("{}", text.red()),
    }
}

/// Create a new progress bar
pub fn create_progress_bar(length: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(length);
    if
        let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}"
        )
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message(message.to_string());
    pb
}

/// Display a spinner while waiting for an operation to complete
pub fn spinner_with_message(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Loop observer that narrates progress on a spinner
pub struct SpinnerObserver {
    spinner: ProgressBar,
}

impl SpinnerObserver {
    pub fn new(spinner: ProgressBar) -> Self {
        Self { spinner }
    }
}

impl LoopObserver for SpinnerObserver {
    fn on_iteration_start(&self, iteration: usize, max_iterations: usize, generating: bool) {
        let stage = if generating { "generating code" } else { "verifying repaired code" };
        self.spinner.set_message(format!("Iteration {}/{}: {}", iteration, max_iterations, stage));
    }

    fn on_outcome_recorded(&self, iteration: usize, outcome: &VerificationOutcome) {
        self.spinner.println(
            format!("  [{}] {:<8} {}", iteration, outcome.tool.to_string(), status_label(outcome.status))
        );
    }

    fn on_repair_requested(&self, iteration: usize, _error_digest: &str) {
        self.spinner.set_message(format!("Iteration {}: repairing", iteration));
    }

    fn on_terminal(&self, status: LoopStatus, iterations: usize, _reason: Option<&AbortReason>) {
        self.spinner.finish_with_message(
            format!("Loop finished: {} after {} iteration(s)", status, iterations)
        );
    }
}

/// Answers clarification questions at the terminal
pub struct TerminalAnswers;

impl AnswerSource for TerminalAnswers {
    fn answer(&self, question: &ClarificationQuestion) -> CvResult<String> {
        println!("\n{} {}", format!("[{}]", question.priority).cyan(), question.question.bold());
        if !question.reason.is_empty() {
            println!("   {}", format!("Reason: {}", question.reason).dimmed());
        }

        Input::<String>::with_theme(&get_theme())
            .with_prompt("Answer")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| CvError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }
}
