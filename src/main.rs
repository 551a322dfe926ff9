//! Deep Research Assistant web UI.
//!
//! Run with:
//!   API_KEY=your_key cargo run
//!
//! Prompt templates are read from `./prompts` once at startup.

use deep_research::{
    GeminiBackend, GenerationClient, Orchestrator, PromptTemplates, ResearchConfig, server,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ResearchConfig::from_env()?;
    let templates = PromptTemplates::load(&config.prompts_dir)?;
    info!(dir = %config.prompts_dir.display(), "Prompt templates loaded");

    let client = GenerationClient::new(
        Arc::new(GeminiBackend::new(&config)),
        Arc::new(templates),
        config.stages.clone(),
    );
    let orchestrator = Arc::new(Orchestrator::new(client).verbose(true));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Deep Research Assistant listening on http://{}", listener.local_addr()?);
    axum::serve(listener, server::router(orchestrator)).await?;

    Ok(())
}
