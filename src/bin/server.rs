//! Clubhub HTTP server
//!
//! Run with: clubhub-server

use clap::{ArgAction, Parser};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clubhub::error::{ClubhubError, Result};
use clubhub::http::{AppState, HttpServer};
use clubhub::search::{FuzzyCapability, SearchConfig};
use clubhub::storage::Storage;
use clubhub::types::{StorageConfig, StorageMode};

#[derive(Parser, Debug)]
#[command(name = "clubhub-server")]
#[command(about = "Clubhub REST API server")]
#[command(version)]
struct Args {
    /// Database path
    #[arg(
        long,
        env = "CLUBHUB_DB_PATH",
        default_value = "~/.local/share/clubhub/clubhub.db"
    )]
    db_path: String,

    /// Storage mode (local or cloud-safe)
    #[arg(long, env = "CLUBHUB_STORAGE_MODE", default_value = "local")]
    storage_mode: String,

    /// Register the SQL trigram functions (disable to force in-process ranking)
    #[arg(long, env = "CLUBHUB_TRIGRAM", default_value_t = true, action = ArgAction::Set)]
    trigram: bool,

    /// HTTP port
    #[arg(long, env = "CLUBHUB_HTTP_PORT", default_value = "8080")]
    port: u16,

    /// Re-score in process when database ranking finds nothing
    #[arg(long, env = "CLUBHUB_SEARCH_SAFETY_NET", default_value_t = true, action = ArgAction::Set)]
    safety_net: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    // Expand ~ in path
    let db_path = shellexpand::tilde(&args.db_path).to_string();

    let storage_mode: StorageMode = args.storage_mode.parse().map_err(ClubhubError::Config)?;

    let config = StorageConfig {
        db_path,
        storage_mode,
        trigram_functions: args.trigram,
    };

    let storage = Storage::open(config)?;

    if let Some(warning) = storage.storage_mode_warning() {
        tracing::warn!("{}", warning);
    }

    let capability = FuzzyCapability::new(Arc::new(storage.clone()));
    // Resolve before serving so the first search does not pay for it
    capability.outcome();

    let search_config = SearchConfig {
        safety_net: args.safety_net,
        ..SearchConfig::default()
    };

    let state = AppState::new(storage, capability, search_config);
    HttpServer::new(state, args.port).start().await?;

    Ok(())
}
