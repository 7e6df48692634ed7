//! promptsweep - test models against a list of prompts and parameter sweeps.

mod cli;
mod config;
mod corpus;
mod errors;
mod providers;
mod results;
mod runner;
mod sweep;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub(crate) const VERSION: &str = "0.1.0";

#[derive(Parser)]
#[command(
    name = "promptsweep",
    about = "promptsweep - Prompt and sampling-parameter sweep harness",
    version = VERSION
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sweep: every prompt against every option set.
    Run(cli::RunArgs),
    /// List the prompt groups found in the corpus.
    Groups {
        /// Prompt corpus root (defaults to the configured directory).
        #[arg(long)]
        prompts_dir: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default to warn so diagnostics never interleave with the streamed
    // response on stdout; RUST_LOG overrides.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();

    match cli.command {
        Commands::Run(args) => cli::cmd_run(args),
        Commands::Groups { prompts_dir } => cli::cmd_groups(prompts_dir),
    }
}
