//! TAAR CLI
//!
//! A command-line tool for querying add-on recommendations and operating
//! the recommendation service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{recommend, reload, status};
use output::OutputFormat;

/// TAAR add-on recommendation CLI
#[derive(Parser)]
#[command(name = "taar")]
#[command(author, version, about = "CLI for the TAAR add-on recommendation service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via TAAR_API_URL env var)
    #[arg(long, env = "TAAR_API_URL")]
    pub api_url: Option<String>,

    /// Output format [default: table]
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get add-on recommendations for a client
    Recommend {
        /// Client ID to recommend for
        client_id: String,

        /// Maximum number of add-ons (service default if not specified)
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show service health and readiness
    Status,

    /// Reload the recommender data files now
    Reload,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or_default();

    // Initialize client
    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;

    // Execute command
    match cli.command {
        Commands::Recommend { client_id, limit } => {
            recommend::recommend(&client, &client_id, limit, format).await?;
        }
        Commands::Status => {
            status::show_status(&client, format).await?;
        }
        Commands::Reload => {
            reload::reload(&client, format).await?;
        }
    }

    Ok(())
}
