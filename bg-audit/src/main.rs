//! bg-audit - Video compliance audit microservice
//!
//! Default port: 8000
//!
//! `bg-audit serve` exposes POST /audit and GET /health;
//! `bg-audit audit <URL>` runs a single audit and prints the JSON verdict.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bg_audit::config::AuditServiceConfig;
use bg_audit::services::{
    AzureChatClient, AzureEmbeddingClient, AzureSearchRetriever, AzureVideoIndexerClient,
    VideoIndexerExtractor, YtDlpDownloader,
};
use bg_audit::workflow::{AnalysisStage, AuditWorkflow, ExtractionStage};
use bg_audit::AppState;

/// Command-line arguments for bg-audit
#[derive(Parser, Debug)]
#[command(name = "bg-audit")]
#[command(about = "Video compliance audit microservice")]
#[command(version)]
struct Args {
    /// TOML config file (default: ~/.config/brand-guardian/bg-audit.toml)
    #[arg(short, long, global = true, env = "BG_AUDIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long, env = "BG_AUDIT_PORT")]
        port: Option<u16>,
    },
    /// Audit a single video and print the result as JSON
    Audit {
        /// Video URL to audit
        video_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = bg_common::config::load_toml_config(args.config.as_deref(), "bg-audit")
        .context("Failed to load configuration file")?;

    // Initialize tracing
    let default_filter = toml_config
        .logging
        .filter_directive(&["bg_audit", "bg_common", "tower_http"]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bg-audit v{}", env!("CARGO_PKG_VERSION"));

    let config = AuditServiceConfig::resolve(&toml_config)
        .context("Service configuration is incomplete")?;
    config.report_telemetry();

    let workflow = build_workflow(&config)?;

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(workflow, port.unwrap_or(config.port)).await,
        Command::Audit { video_url } => {
            let workflow = Arc::new(workflow);
            let response = tokio::spawn(async move { workflow.run_audit(&video_url).await })
                .await
                .context("Audit workflow failed")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

/// Wire the concrete adapters into the two-stage workflow
fn build_workflow(config: &AuditServiceConfig) -> Result<AuditWorkflow> {
    let downloader = Arc::new(YtDlpDownloader::new(config.yt_dlp_path.clone()));
    let indexer = Arc::new(
        AzureVideoIndexerClient::new(config.video_indexer.clone())
            .context("Failed to create Video Indexer client")?,
    );
    let extractor = Arc::new(VideoIndexerExtractor::new(downloader, indexer));

    let embeddings =
        AzureEmbeddingClient::new(&config.openai).context("Failed to create embeddings client")?;
    let retriever = Arc::new(
        AzureSearchRetriever::new(&config.search, embeddings)
            .context("Failed to create search client")?,
    );
    let model =
        Arc::new(AzureChatClient::new(&config.openai).context("Failed to create chat client")?);

    Ok(AuditWorkflow::new(
        ExtractionStage::new(extractor),
        AnalysisStage::new(retriever, model).with_rule_count(config.search.top_k),
    ))
}

async fn serve(workflow: AuditWorkflow, port: u16) -> Result<()> {
    let app = bg_audit::build_router(AppState::new(workflow));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
