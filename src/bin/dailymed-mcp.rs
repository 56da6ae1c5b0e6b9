//! DailyMed MCP Server - Main binary

use anyhow::Result;
use clap::Parser;
use dailymed_mcp::transport::{Transport, http::HttpTransport, stdio::StdioTransport};
use dailymed_mcp::{McpServer, ServerConfig, TransportMode};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dailymed-mcp")]
#[command(about = "DailyMed drug labeling Model Context Protocol Server")]
#[command(version)]
struct Cli {
    /// Host to bind to for HTTP transport
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port to bind to for HTTP transport
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Transport mode
    #[arg(long, value_enum, default_value = "stdio")]
    transport: TransportMode,

    /// DailyMed v2 REST base URL
    #[arg(long, env = "DAILYMED_BASE_URL", default_value = dailymed_mcp::client::DEFAULT_BASE_URL)]
    base_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Directory containing pharmacologic_class_mappings.txt and rxnorm_mappings.txt
    #[arg(long, env = "DAILYMED_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Render nested label sections into their parent section
    #[arg(long)]
    include_subsections: bool,
}

fn init_tracing(log_level: &str, stdio: bool) {
    let filter = tracing_subscriber::EnvFilter::new(log_level);
    if stdio {
        // stdout carries JSON-RPC
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.transport.uses_stdio());

    info!("Starting DailyMed MCP Server v{}", dailymed_mcp::VERSION);

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        log_level: cli.log_level,
        transport: cli.transport,
        base_url: cli.base_url,
        request_timeout_secs: cli.timeout,
        data_dir: cli.data_dir,
        include_subsections: cli.include_subsections,
        ..Default::default()
    };

    let server = match McpServer::initialize(config.clone()) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to initialize server: {:#}", e);
            return Err(e);
        }
    };

    let stats = server.client().index().statistics();
    info!(
        "Mapping index ready: {} RxNorm mappings, {} pharmacologic class mappings",
        stats.rx_norm_mappings, stats.pharmacologic_class_mappings
    );

    let shutdown_signal = async {
        match signal::ctrl_c().await {
            Ok(_) => info!("Received Ctrl+C, shutting down..."),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
    };

    match config.transport {
        TransportMode::Stdio => {
            info!("Starting stdio transport for MCP client integration");
            let transport = StdioTransport::new();

            tokio::select! {
                result = transport.start(Box::new(server.clone())) => {
                    match result {
                        Ok(_) => info!("Stdio transport completed"),
                        Err(e) => error!("Stdio transport error: {}", e),
                    }
                }
                _ = shutdown_signal => {
                    if let Err(e) = transport.shutdown().await {
                        error!("Error during stdio transport shutdown: {}", e);
                    }
                }
            }
        }
        TransportMode::Http => {
            let transport = HttpTransport::new(config.host.clone(), config.port);

            tokio::select! {
                result = transport.start(Box::new(server.clone())) => {
                    match result {
                        Ok(_) => info!("HTTP transport completed"),
                        Err(e) => error!("HTTP transport error: {}", e),
                    }
                }
                _ = shutdown_signal => {
                    if let Err(e) = transport.shutdown().await {
                        error!("Error during HTTP transport shutdown: {}", e);
                    }
                }
            }
        }
        TransportMode::Both => {
            info!("Starting both stdio and HTTP transports");
            let stdio_transport = StdioTransport::new();
            let http_transport = HttpTransport::new(config.host.clone(), config.port);

            let stdio_server = server.clone();
            let stdio_task = tokio::spawn(async move {
                if let Err(e) = stdio_transport.start(Box::new(stdio_server)).await {
                    error!("Stdio transport error: {}", e);
                }
            });

            let http_handle = http_transport.clone();
            let http_task = tokio::spawn(async move {
                if let Err(e) = http_transport.start(Box::new(server)).await {
                    error!("HTTP transport error: {}", e);
                }
            });

            tokio::select! {
                _ = stdio_task => info!("Stdio transport task completed"),
                _ = http_task => info!("HTTP transport task completed"),
                _ = shutdown_signal => {}
            }
            if let Err(e) = http_handle.shutdown().await {
                error!("Error during HTTP transport shutdown: {}", e);
            }
        }
    }

    info!("DailyMed MCP Server shutdown complete");
    Ok(())
}
