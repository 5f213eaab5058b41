// Entrypoint for the CLI application.
// Parses flags, sets up logging and configuration, then hands an API
// client to the interactive shell.

use anyhow::Context;
use clap::Parser;
use inventory_cli::{
    api::ApiClient,
    config::{Config, Overrides},
    logging::init_logging,
    render::OutputFormat,
    ui::{Shell, Terminal},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inventory-cli")]
#[command(about = "Interactive client for the inventory management API", long_about = None)]
struct Cli {
    /// Base URL of the inventory service
    #[arg(short, long)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// How responses are printed
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Config file (defaults to <config dir>/inventory-cli/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&Overrides {
        config_path: cli.config,
        base_url: cli.base_url,
        timeout_secs: cli.timeout,
        output: cli.output,
    })?;
    tracing::info!(base_url = %config.base_url, timeout_secs = config.timeout_secs, "configuration loaded");

    let api = ApiClient::from_config(&config).context("Failed to build HTTP client")?;

    println!("--- Inventory Management API Client ---");

    // Blocks until the user exits from the logged-out menu.
    Shell::new(api, Terminal, config.output).run()
}
