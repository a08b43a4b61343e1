mod config;
mod dispatcher;
mod document;
mod embeddings;
mod errors;
mod llm_client;
mod routes;
mod state;
mod tools;
mod upload;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::embeddings::OpenAiEmbedder;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PDF agent API v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.llm_timeout_secs);

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_api_key.clone(), &config.openai_base_url, timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize embedding client
    let embedder = OpenAiEmbedder::new(config.openai_api_key.clone(), &config.openai_base_url, timeout)?;
    info!("Embedding client initialized (model: {})", embeddings::EMBEDDING_MODEL);

    let registry = ToolRegistry::standard();
    info!(count = registry.len(), tools = ?registry.names(), "Tool registry ready");

    std::fs::create_dir_all(&config.upload_dir)?;
    info!(
        "Uploads go to {} (limit {} bytes), tool failures: {:?}",
        config.upload_dir.display(),
        config.max_upload_bytes,
        config.tool_failure_policy
    );

    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        Arc::new(llm),
        Arc::new(embedder),
        config.tool_failure_policy,
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        dispatcher: Arc::new(dispatcher),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
