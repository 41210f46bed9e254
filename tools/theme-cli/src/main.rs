//! Theme CLI - drive storefront theme components from the command line.
//!
//! Commands:
//! - `theme sections` - Fetch section renders and summarize them
//! - `theme filter` - Apply facet filters to a collection page
//! - `theme load-more` - Page through a collection via the pagination controller
//! - `theme config` - Manage configuration
//!
//! Every command can talk to a live store, record the exchanges it makes
//! (`--record`), or run entirely from a recording (`--replay`).

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfigArgs, FilterArgs, LoadMoreArgs, SectionsArgs};

/// Theme CLI - exercise storefront theme components against a store
#[derive(Parser)]
#[command(name = "theme")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Serve requests from a recording instead of the store
    #[arg(long, global = true, conflicts_with = "record")]
    replay: Option<String>,

    /// Record every exchange into the recordings directory
    #[arg(long, global = true)]
    record: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch section renders for a page
    Sections(SectionsArgs),

    /// Apply filters to a collection page
    Filter(FilterArgs),

    /// Load further result pages until exhausted
    LoadMore(LoadMoreArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output, cli.replay.as_deref(), cli.record)?;

    // Execute command
    let result = match cli.command {
        Commands::Sections(args) => commands::sections::run(args, &ctx).await,
        Commands::Filter(args) => commands::filter::run(args, &ctx).await,
        Commands::LoadMore(args) => commands::load_more::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
