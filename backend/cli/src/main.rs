mod config;
mod status_cmd;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use grid_gateway::{build_router, start_server, CorsPolicy, GatewayConfig, GatewayState};
use grid_logging::{init_logger, redact_uri_credentials, LogOptions};
use grid_store::{ChunkStore, GridFsStore, MemoryChunkStore};

use config::Config;

#[derive(Parser)]
#[command(name = "gridfs-gateway")]
#[command(about = "HTTP gateway for chunked file upload and retrieval")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the upload gateway
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Keep files in process memory instead of GridFS
        #[arg(long)]
        memory: bool,
    },
    /// Check whether a local gateway is answering
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    init_logger(&LogOptions {
        level: config.log_level.clone(),
        format: config.log_format,
        log_dir: config.log_dir.clone(),
    });

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, memory } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config, memory).await?;
        }
        Commands::Status { port } => {
            status_cmd::run(port.unwrap_or(config.port)).await?;
        }
    }

    Ok(())
}

async fn run_server(config: Config, memory: bool) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        "Starting upload gateway"
    );

    let store = open_store(&config, memory).await?;

    // An unreachable store does not stop the listener; requests fail on use.
    match store.ping().await {
        Ok(()) => info!(backend = store.name(), "Chunk store ready"),
        Err(e) => error!(backend = store.name(), error = %e, "Chunk store connection failed"),
    }

    let gateway_config = GatewayConfig {
        cors: CorsPolicy::new(&config.cors_origins),
        max_upload_bytes: config.max_upload_bytes,
    };
    let app = build_router(GatewayState::new(store), &gateway_config);

    let addr = config
        .socket_addr()
        .with_context(|| format!("Invalid bind address {}", config.bind_address))?;

    start_server(addr, app).await
}

async fn open_store(config: &Config, memory: bool) -> Result<Arc<dyn ChunkStore>> {
    if memory {
        warn!("Using in-memory chunk store; uploads are lost on exit");
        return Ok(Arc::new(MemoryChunkStore::new()));
    }

    let uri = config
        .mongo_uri
        .as_deref()
        .context("MONGO_URI is not set (use --memory for a throwaway store)")?;
    info!(uri = %redact_uri_credentials(uri), "Connecting to GridFS");

    let store = GridFsStore::connect(uri)
        .await
        .context("Invalid MONGO_URI")?;
    Ok(Arc::new(store))
}
