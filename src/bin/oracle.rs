//! Kasportal Oracle CLI
//!
//! Command-line interface for querying the multi-source price oracle.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;

use kasportal_oracle::cli::{
    AggregateCommand, CliApp, Command, OutputFormat, PriceCommand, PricesCommand, SourcesCommand,
    StatsCommand,
};
use kasportal_oracle::core::config::OracleConfig;
use kasportal_oracle::oracle::service::OracleService;

/// Kasportal Oracle CLI - cryptocurrency prices from CoinGecko, Binance and Coinbase
#[derive(Parser)]
#[command(name = "kasportal-oracle")]
#[command(author = "Kasportal Team")]
#[command(version = kasportal_oracle::VERSION)]
#[command(about = "Query the Kasportal price oracle", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, env = "KASPORTAL_ORACLE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (text, json, json-pretty, table)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current price of one pair (e.g. KAS/USD or KAS-USD)
    Price {
        /// Trading pair
        symbol: String,
    },

    /// Prices of every configured pair
    Prices,

    /// Health of each upstream provider
    Sources,

    /// Oracle statistics
    Stats,

    /// Query every source for a pair and show the aggregate
    Aggregate {
        /// Trading pair
        symbol: String,
    },
}

impl From<&Commands> for Command {
    fn from(command: &Commands) -> Self {
        match command {
            Commands::Price { symbol } => Command::Price(PriceCommand { symbol: symbol.clone() }),
            Commands::Prices => Command::Prices(PricesCommand),
            Commands::Sources => Command::Sources(SourcesCommand),
            Commands::Stats => Command::Stats(StatsCommand),
            Commands::Aggregate { symbol } => {
                Command::Aggregate(AggregateCommand { symbol: symbol.clone() })
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let service = OracleService::new(config).context("failed to start oracle service")?;

    let app = CliApp::new(service)
        .with_format(cli.format)
        .with_verbose(cli.verbose);

    let output = app.execute(Command::from(&cli.command)).await?;
    app.output().render(&output);

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<OracleConfig> {
    let config = match &cli.config {
        Some(path) => OracleConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?
            .with_env_overrides(|key| std::env::var(key).ok())?,
        None => OracleConfig::from_env()?,
    };

    config.validate()?;
    Ok(config)
}
