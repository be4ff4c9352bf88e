//! Indigo command-line host: replays stored game logs.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Indigo - a hex tile-laying game of gems and gateways
#[derive(Parser, Debug)]
#[command(name = "indigo")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a game log and print the final snapshot as JSON
    Replay {
        /// Game log file
        log: PathBuf,

        /// Only show this team's hand and actions
        #[arg(short, long)]
        team: Option<String>,

        /// Indent the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Replay a game log and print it in canonical form
    Normalize {
        /// Game log file
        log: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let output = match &args.command {
        Commands::Replay { log, team, pretty } => {
            let text = read_log(log)?;
            commands::replay(&text, team.as_deref(), *pretty)
        }
        Commands::Normalize { log } => {
            let text = read_log(log)?;
            commands::normalize(&text)
        }
    }?;

    println!("{output}");
    Ok(())
}

fn read_log(path: &Path) -> anyhow::Result<String> {
    info!(path = %path.display(), "reading game log");
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
