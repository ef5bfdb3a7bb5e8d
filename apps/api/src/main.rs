mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::analyzer::SignalAnalyzer;
use crate::analysis::prompts::PromptSpec;
use crate::config::{Config, ModelSettings};
use crate::llm_client::{CompletionClient, OpenAiClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values, not on a missing key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Signal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize completion client (only when a credential is present)
    let client: Option<Arc<dyn CompletionClient>> = match &config.openai_api_key {
        Some(key) => {
            let client = OpenAiClient::new(key.clone(), config.client_settings())?;
            info!(
                "LLM client initialized (endpoint: {}, timeout: {:?}, max_retries: {})",
                client.endpoint(),
                config.llm_timeout,
                config.llm_max_retries
            );
            Some(Arc::new(client) as Arc<dyn CompletionClient>)
        }
        None => {
            warn!("OPENAI_API_KEY is not set; analysis requests will be rejected");
            None
        }
    };

    let model = ModelSettings::default();
    info!("Model: {} (temperature {})", model.model, model.temperature);

    let analyzer = SignalAnalyzer::new(client, PromptSpec::job_signal(), model);

    // Build app state
    let state = AppState {
        config: config.clone(),
        analyzer: Arc::new(analyzer),
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
