//! capmap: capacity-provider placement reporter.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration from a TOML file, builds the ECS control-plane client and
//! the task metadata client, sets up the Axum router, and starts the HTTP
//! server.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capmap::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use capmap::ecs::EcsControlPlane;
use capmap::http::shutdown;
use capmap::metadata::MetadataClient;
use capmap::routes::create_router;
use capmap::state::AppState;

/// capmap: reports each task's capacity provider placement
#[derive(Parser, Debug)]
#[command(name = "capmap", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "capmap=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        list_cluster = %config.ecs.list_cluster,
        describe_cluster = %config.ecs.describe_cluster,
        region = ?config.ecs.region,
        "Loaded configuration"
    );

    // Build the control-plane client once at startup. Credentials resolve
    // here through the SDK's default chain, never inside a request.
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = config.ecs.region.clone() {
        loader = loader.region(aws_config::Region::new(region));
    }
    let sdk_config = loader.load().await;
    let control_plane = Arc::new(EcsControlPlane::new(aws_sdk_ecs::Client::new(&sdk_config)));

    // Task metadata endpoint client for this container
    let metadata_base = config.metadata.resolve_base_url()?;
    let metadata = MetadataClient::new(metadata_base.clone(), &config.metadata)?;
    tracing::info!(base_url = %metadata_base, "Task metadata endpoint configured");

    // Create application state and router
    let state = AppState::new(config.clone(), control_plane, metadata);
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .expect("Invalid http.host or http.port in config");
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    Ok(())
}
