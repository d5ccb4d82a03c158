//! Pool Tracker - top liquidity pools for a token across BSC, Ethereum and Base
//!
//! Run with: cargo run -- <TOKEN_ADDRESS> [--api-key KEY] [--chains bsc,base]

use clap::Parser;
use color_eyre::eyre::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod chains;
mod config;
mod discovery;
mod error;
mod format;
mod math;
mod render;
mod types;

use config::Config;
use types::{parse_chain_list, SourceStrategy};

#[derive(Debug, Parser)]
#[command(name = "pool-tracker", version, about = "Find the top liquidity pools for an ERC-20 token")]
struct Args {
    /// Token contract address (0x + 40 hex characters)
    token: String,

    /// The Graph gateway API key (overrides GRAPH_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Chains to search, e.g. "bsc,ethereum,base" (default: all)
    #[arg(long, value_delimiter = ',')]
    chains: Vec<String>,

    /// Source strategy: subgraph or aggregator
    #[arg(long)]
    strategy: Option<SourceStrategy>,

    /// Maximum number of pools to show
    #[arg(long)]
    limit: Option<usize>,

    /// Load settings from a TOML file instead of the environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings (without the API key) to a TOML file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging and configuration summary
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Command-line flags win over file / environment settings
    fn apply_to(&self, config: &mut Config) {
        if let Some(key) = &self.api_key {
            config.graph_api_key = Some(key.clone());
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(limit) = self.limit {
            config.max_results = limit;
        }
    }
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" 🔎 POOL TRACKER - Liquidity Pool Finder").cyan().bold()
    );
    println!(
        "{}",
        style("    BSC | Ethereum | Base").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("pool_tracker={}", level).parse()?),
        )
        .init();
    Ok(())
}

fn spinner(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    bar.set_message("Scanning chains...");
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    args.apply_to(&mut config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    if let Some(path) = &args.save_config {
        config.save_to_file(path)?;
        println!("{} Settings written to {}", style("✓").green(), path.display());
    }

    let chains = if args.chains.is_empty() {
        config.default_chains.clone()
    } else {
        parse_chain_list(&args.chains)?
    };

    if !args.json {
        print_banner();
        if args.verbose {
            config.print_summary();
            println!();
        }
    }

    if config.strategy == SourceStrategy::Subgraph
        && config.api_key().is_none()
        && config.subgraph_overrides.is_empty()
    {
        warn!("No Graph API key set: gateway subgraphs will be skipped");
    }

    let bar = spinner(args.json)?;
    let result = discovery::search_pools(&config, &args.token, &chains).await;
    bar.finish_and_clear();
    let report = result?;

    if args.json {
        println!("{}", render::to_json(&report)?);
    } else {
        render::print_report(&report);
    }

    Ok(())
}
