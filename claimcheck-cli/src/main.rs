//! Claimcheck CLI: verify a natural-language claim from the terminal.
//!
//! One-shot interface over `claimcheck-core`: submits the claim, watches
//! the request state, and renders the outcome.

mod clipboard;
mod markdown;
mod output;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use claimcheck_core::{GeminiBackend, RequestState, Verifier, VerifyError, load_config};

/// Claimcheck: web-grounded fact verification for natural-language claims
#[derive(Parser, Debug)]
#[command(name = "claimcheck", version, about, long_about = None)]
struct Cli {
    /// Claim to verify
    claim: String,

    /// Model to use (overrides configuration)
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Copy the analysis to the clipboard as plain text
    #[arg(long)]
    copy: bool,

    /// Disable ANSI colors in output
    #[arg(long)]
    no_color: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = load_config(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(model) = &cli.model {
        config.backend.model = model.clone();
    }

    let backend = GeminiBackend::new(&config.backend)
        .map_err(|e| anyhow::anyhow!("Backend setup failed: {}", e))?;
    let verifier = Arc::new(Verifier::new(Arc::new(backend)));

    // Observe state transitions; the snapshot is read-only on this side.
    let mut state_rx = verifier.subscribe();
    let quiet = cli.quiet;
    let progress = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let loading = state_rx.borrow_and_update().state.is_loading();
            if loading && !quiet {
                eprintln!("Checking claim against web sources...");
            }
        }
    });

    let submitted = verifier.submit(&cli.claim).await;
    progress.abort();

    if let Err(VerifyError::EmptyClaim) = submitted {
        eprintln!("Please enter a claim to verify.");
        std::process::exit(2);
    }

    let snapshot = verifier.snapshot();
    match snapshot.state {
        RequestState::Succeeded(result) => {
            output::print_result(&snapshot.claim, &result, !cli.no_color);

            if cli.copy {
                let plain = markdown::to_plain_text(&result.analysis);
                if clipboard::copy_plain_text(&plain) {
                    if !cli.quiet {
                        eprintln!("Analysis copied to clipboard.");
                    }
                } else {
                    eprintln!("Could not copy text to clipboard.");
                }
            }
        }
        RequestState::Failed(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
        other => {
            // Unreachable after a completed submit; log rather than crash.
            debug!(?other, "Verification ended in a non-terminal state");
        }
    }

    Ok(())
}
