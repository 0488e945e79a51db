//! marq CLI
//!
//! Command-line interface for marq - bookmarks kept live against a
//! remote store.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use marq_core::{ApiClient, Config};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "marq")]
#[command(about = "marq - bookmarks with live sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a new bookmark
    #[command(alias = "create")]
    Add {
        /// URL to save
        url: String,
        /// Display title
        #[arg(short, long)]
        title: String,
    },
    /// List saved bookmarks
    #[command(alias = "ls")]
    List,
    /// Request deletion of a bookmark
    #[command(alias = "delete")]
    Rm {
        /// Bookmark id
        id: Uuid,
    },
    /// Watch the collection update live
    Watch,
    /// Show session and connection details
    Status,
    /// Sign out of the current session
    Logout,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, feed_url, token, request_timeout_secs)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config management doesn't need a client
    if let Commands::Config { command } = &cli.command {
        return commands::config::run(command.clone(), &output);
    }

    let config = Config::load()?;
    let client = Arc::new(ApiClient::new(&config)?);

    match cli.command {
        Commands::Add { url, title } => {
            commands::add::run(client.as_ref(), &url, &title, &output).await
        }
        Commands::List => commands::list::run(client.as_ref(), &output).await,
        Commands::Rm { id } => commands::rm::run(client.as_ref(), id, &output).await,
        Commands::Watch => commands::watch::run(client, &config, &output).await,
        Commands::Status => commands::status::run(client.as_ref(), &config, &output).await,
        Commands::Logout => commands::logout::run(client.as_ref(), &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marq=warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
