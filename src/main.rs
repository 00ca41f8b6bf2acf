use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use tg_warehouse::config::Config;
use tg_warehouse::logging;
use tg_warehouse::pipeline::Processor;
use tg_warehouse::scraper::{Fetcher, TelegramPreviewClient};
use tg_warehouse::server;
use tg_warehouse::storage::{SqliteStorage, Storage};

#[derive(Parser)]
#[command(name = "tg_warehouse")]
#[command(about = "Telegram channel message scraper and normalization warehouse")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape configured channels for new raw messages
    Fetch {
        /// Specific channels (comma-separated); defaults to the config list
        #[arg(long)]
        channels: Option<String>,
    },
    /// Run the normalization pipeline over all pending raw messages
    Process,
    /// Fetch and then process, sequentially
    Run {
        /// Specific channels (comma-separated); defaults to the config list
        #[arg(long)]
        channels: Option<String>,
    },
    /// Start the HTTP API server
    Serve,
}

fn channel_list(config: &Config, override_arg: Option<String>) -> Vec<String> {
    match override_arg {
        Some(arg) => arg.split(',').map(|s| s.trim().to_string()).collect(),
        None => config.scraper.channels.clone(),
    }
}

async fn run_fetch(
    config: &Config,
    storage: Arc<dyn Storage>,
    channels: Option<String>,
) -> anyhow::Result<()> {
    let channels = channel_list(config, channels);
    let fetcher = Fetcher::new(Box::new(TelegramPreviewClient::new()), storage);
    let inserted = fetcher
        .fetch_channels(
            &channels,
            config.scraper.fetch_limit,
            config.scraper.metadata_file.as_ref(),
        )
        .await?;
    println!("📥 Inserted {inserted} new raw messages from {} channels", channels.len());
    Ok(())
}

async fn run_process(storage: Arc<dyn Storage>) -> anyhow::Result<()> {
    let summary = Processor::new(storage).process_pending_batch().await?;
    println!("\n📊 Pipeline results:");
    println!("   Raw messages processed: {}", summary.processed_count);
    println!("   Canonical messages inserted: {}", summary.canonical_count);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(&config.database.path)?);

    match cli.command {
        Commands::Fetch { channels } => {
            run_fetch(&config, storage, channels).await?;
        }
        Commands::Process => {
            run_process(storage).await?;
        }
        Commands::Run { channels } => {
            run_fetch(&config, storage.clone(), channels).await?;
            run_process(storage).await?;
        }
        Commands::Serve => {
            let addr = config.server.bind_addr.parse()?;
            info!("Starting API server");
            server::run_server(addr, storage).await?;
        }
    }

    Ok(())
}
