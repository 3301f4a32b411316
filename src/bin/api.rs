use finance_brief_orchestrator::{
    api::start_server, collaborators::build_http_collaborators, documents::FsDocumentStore,
    OrchestratorConfig, Pipeline,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = OrchestratorConfig::from_env()?;

    info!("🚀 Finance Brief Orchestrator - API Server");
    info!("📍 Port: {}", config.port);
    info!(
        threshold = config.retrieval_score_threshold,
        top_k = config.retrieval_top_k,
        docs_dir = %config.docs_dir.display(),
        "Pipeline configuration"
    );

    // Create components
    let collaborators = build_http_collaborators(&config)?;
    let documents = Arc::new(FsDocumentStore::new(config.docs_dir.clone()));
    let pipeline = Arc::new(Pipeline::new(&config, collaborators, documents));

    info!("✅ Pipeline initialized");
    info!("📡 Starting API server...");

    // Start API server
    start_server(pipeline, config.port).await?;

    Ok(())
}
