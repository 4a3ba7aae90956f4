mod aggregate;
mod analysis;
mod completion;
mod config;
mod errors;
mod models;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::aggregate::{run_aggregation_jobs, run_split_job};
use crate::analysis::analyze_batch;
use crate::analysis::orchestrator::RetryOrchestrator;
use crate::completion::{ChatRequest, CompletionBackend, CompletionClient};
use crate::config::Config;
use crate::models::posting::Posting;

#[derive(Parser)]
#[command(name = "analyzer", version, about = "Job-posting skill analysis pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a corpus of postings for one role category.
    Analyze {
        /// Role key (backend, frontend, ai-ml, data, ...).
        #[arg(long)]
        role: String,
        /// JSON array of posting records.
        #[arg(long)]
        input: PathBuf,
        /// Output path for the analysis records.
        #[arg(long)]
        output: PathBuf,
    },
    /// Partition analyzed corpora into new-grad / experienced files.
    Split {
        #[arg(long, default_value = "jobs")]
        jobs_dir: PathBuf,
    },
    /// Aggregate partitioned corpora into key-skill artifacts.
    Aggregate {
        #[arg(long, default_value = "jobs")]
        jobs_dir: PathBuf,
        /// Restrict the run to specific role keys (comma separated).
        #[arg(long, value_delimiter = ',')]
        roles: Option<Vec<String>>,
    },
    /// Probe the completion service with a trivial prompt.
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars).
    let config = Config::from_env()?;

    // Initialize structured logging.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting analyzer v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let client = CompletionClient::new(&config);

    match cli.command {
        Command::Analyze { role, input, output } => {
            let raw = std::fs::read_to_string(&input)?;
            let postings: Vec<Posting> = serde_json::from_str(&raw)?;
            info!(count = postings.len(), %role, "loaded posting corpus");

            let orchestrator = RetryOrchestrator::default();
            let results = analyze_batch(&client, &orchestrator, &postings, &role).await;

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, serde_json::to_string_pretty(&results)?)?;
            info!(path = %output.display(), records = results.len(), "analysis written");
        }
        Command::Split { jobs_dir } => {
            run_split_job(&jobs_dir)?;
        }
        Command::Aggregate { jobs_dir, roles } => {
            run_aggregation_jobs(&client, &jobs_dir, roles.as_deref()).await?;
        }
        Command::Ping => {
            let request = ChatRequest::new(
                "You are a terse assistant.",
                "Reply with the single digit 5.",
                10,
            );
            let reply = client.complete(&request).await?;
            info!(reply = reply.trim(), ok = reply.contains('5'), "completion service reachable");
        }
    }

    Ok(())
}
