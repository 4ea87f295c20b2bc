//! docrag web service - streaming documentation Q&A over HTTP.

use anyhow::Result;
use clap::Parser;
use docrag_embeddings::OllamaEmbedder;
use docrag_llm::{GeminiChat, OllamaChat};
use docrag_rag::{BackendRegistry, PipelineConfig, RagPipeline};
use docrag_vectors::ChromaStore;
use std::sync::Arc;
use tracing::info;

mod config;
mod routes;
mod state;

use config::Config;
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "docrag-web")]
#[command(about = "docrag web service - streaming documentation Q&A over HTTP")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Resolving the collection id here surfaces a misconfigured store at
    // startup instead of on the first request
    let store =
        ChromaStore::connect(&config.db_host, config.db_port, &config.collection).await?;
    let embedder = OllamaEmbedder::new(&config.ollama_endpoint);

    let mut backends = BackendRegistry::new(Arc::new(OllamaChat::new(&config.ollama_endpoint)));
    match &config.gemini_api_key {
        Some(key) => backends = backends.with_hosted_large(Arc::new(GeminiChat::new(key))),
        None => info!("GEMINI_API_KEY not set; hosted-large-model is disabled"),
    }

    let pipeline_config = PipelineConfig {
        stage_timeout_secs: config.stage_timeout_secs,
        ..PipelineConfig::default()
    };
    let pipeline =
        RagPipeline::with_config(Arc::new(embedder), Arc::new(store), backends, pipeline_config);
    let state = AppState::new(pipeline);

    let app = routes::create_router(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    info!("serving chat queries on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
