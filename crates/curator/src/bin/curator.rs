//! curator: run one fraud report through the detection workflow and print
//! the verdict as JSON.
//!
//! Configuration comes from the environment (and `.env`), see
//! `curator_core::config`.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use curator_core::config::{load_dotenv, Config};
use fraud_curator::{DetectionOptions, FraudCurator};

// ── CLI ─────────────────────────────────────────────────────────────

/// Classify a user-reported case as fraud or not.
#[derive(Parser, Debug)]
#[command(name = "curator", version, about)]
struct Cli {
    /// Report text. Read from stdin when omitted.
    text: Option<String>,

    /// Config profile (overrides CURATOR_PROFILE).
    #[arg(long, env = "CURATOR_PROFILE")]
    profile: Option<String>,

    /// File with one historical case per line, loaded into the index first.
    #[arg(long)]
    history: Option<PathBuf>,

    /// Number of similar cases to retrieve.
    #[arg(long)]
    k: Option<usize>,

    /// Skip the summary stage.
    #[arg(long)]
    no_summary: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = match cli.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.log_summary();

    let curator = FraudCurator::from_config(&config).context("failed to build detection pipeline")?;

    let mut options = DetectionOptions::from(&config.detection);
    if let Some(k) = cli.k {
        options.k = k;
    }
    if cli.no_summary {
        options.summarize = false;
    }

    if let Some(path) = &cli.history {
        let history = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read history file {}", path.display()))?;
        let mut loaded = 0usize;
        for line in history.lines().filter(|l| !l.trim().is_empty()) {
            curator
                .add_case(line, None, options.timeout)
                .await
                .context("failed to index historical case")?;
            loaded += 1;
        }
        info!(path = %path.display(), cases = loaded, "historical cases indexed");
    }

    let text = match cli.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read report from stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        bail!("no report text given");
    }

    let verdict = curator.run_fraud_detection(&text, &options).await?;

    if verdict.new_type_name.is_some() {
        if let Some(path) = &config.detection.fraud_types_path {
            curator
                .registry()
                .save(path)
                .with_context(|| format!("failed to save fraud types to {}", path.display()))?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}
