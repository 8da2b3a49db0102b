mod cancel;
mod cli_args;
mod config;
mod git;
mod llm;
mod logging;
mod setup;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::cancel::{CancelToken, Interrupted};
use crate::cli_args::Cli;
use crate::config::Config;
use crate::git::{DiffSource, GitCli};
use crate::llm::Summarizer;
use crate::llm::prompt_builder::{MAX_DIFF_CHARS, build_prompt};

/// Collect the pending changes and ask the model to summarize them.
///
/// Returns `None` when the working tree has nothing to summarize.
fn summarize_changes(
    cfg: &Config,
    source: &dyn DiffSource,
    llm: &dyn Summarizer,
    cancel: &CancelToken,
) -> Result<Option<String>> {
    let diff = source.diff(cfg.staged_only)?;
    if cancel.is_cancelled() {
        return Err(Interrupted::Cancelled.into());
    }

    if diff.is_empty() {
        return Ok(None);
    }

    log::info!("Staged diff:    {} chars", diff.staged.chars().count());
    log::info!("Unstaged diff:  {} chars", diff.unstaged.chars().count());
    log::info!("Untracked diff: {} chars", diff.untracked.chars().count());
    log::info!("Model:          {}", cfg.model);
    log::info!("Project:        {}", cfg.project);
    log::info!("Region:         {}", cfg.region);

    let (prompt, truncated) = build_prompt(&diff.combined());
    if truncated {
        log::warn!("diff truncated to {MAX_DIFF_CHARS} characters");
    }

    log::debug!("Prompt is {} chars", prompt.chars().count());

    let spinner = spinner(format!("Asking {}", llm.describe()));
    let summary = llm.summarize(cancel, &prompt);
    spinner.finish_and_clear();

    summary.map(Some)
}

/// Spinner on stderr; hidden automatically when stderr is not a terminal.
fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        eprintln!("gitsum v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    logging::init_logger(cli.verbosity());

    let cfg = Config::from_sources(&cli)?;

    // diff collection and the model call both watch this token
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .context("failed to install interrupt handler")?;

    let source = GitCli::new(&cfg.dir, cancel.clone());
    let llm = setup::build_summarizer(&cfg);

    match summarize_changes(&cfg, &source, llm.as_ref(), &cancel)? {
        Some(summary) => println!("{summary}"),
        None => eprintln!("No changes detected."),
    }

    Ok(())
}
