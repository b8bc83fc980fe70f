#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;
mod feed;

use clap::{Parser, Subcommand};
use command::{
    CommandStrategy, InfoStrategy, InitStrategy, ReplayInput, ReplayStrategy, RunInput,
    RunStrategy, VersionStrategy,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "curator")]
#[command(about = "Consensus news curation with LLM voting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Curate a batch of feed items with the configured models
    Run {
        /// JSON file of feed items
        #[arg(short, long)]
        input: PathBuf,

        /// Config file to use instead of ~/curator/config.json
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for feed.json and feed_overflow.json
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Re-run a recorded session offline
    Replay {
        /// Session file with items and recorded responses
        #[arg(short, long)]
        session: PathBuf,

        /// Directory for feed.json and feed_overflow.json
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Initialize configuration
    Init,
    /// Show configuration
    Info,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            config,
            output_dir,
        } => {
            RunStrategy
                .execute(RunInput {
                    input,
                    config,
                    output_dir,
                })
                .await
        }
        Commands::Replay {
            session,
            output_dir,
        } => {
            ReplayStrategy
                .execute(ReplayInput {
                    session,
                    output_dir,
                })
                .await
        }
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
