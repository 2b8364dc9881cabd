mod config;
mod extractor;
mod llm_client;
mod note;
mod prompt;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use config::{ApiStyle, Config};
use llm_client::LlmClient;
use server::AppState;

/// HTTP service for transcript section extraction and procedural note generation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(short, long)]
    bind: Option<String>,

    /// Base URL of the OpenAI-compatible completion endpoint
    #[arg(short, long)]
    llm_url: Option<String>,

    /// Default model for note generation
    #[arg(short, long)]
    model: Option<String>,

    /// Request shape: "chat" or "completion"
    #[arg(short, long)]
    api_style: Option<ApiStyle>,

    /// Upstream request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::from_env();
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(url) = self.llm_url {
            config.llm_base_url = url;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(style) = self.api_style {
            config.api_style = style;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = args.into_config();

    let client = LlmClient::new(&config.llm_base_url, config.request_timeout())
        .context("Failed to create LLM client")?;

    info!(
        "note generation via {} ({:?} style, model {})",
        client.base_url(),
        config.api_style,
        config.model
    );

    let bind_address = config.bind_address.clone();
    let app = server::router(Arc::new(AppState { config, client }));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
