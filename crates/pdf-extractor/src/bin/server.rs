//! PDF extractor server binary
//!
//! Run with: cargo run -p pdf-extractor --bin pdf-extractor-server

use pdf_extractor::{config::AppConfig, server::ExtractorServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_extractor=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                      PDF Extractor                        ║
║          PDF to structured JSON and CSV via LLM           ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config = AppConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM endpoint: {}", config.llm.base_url);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!(
        "  - Chunking: single shot up to {} chars, {} chars per chunk",
        config.extraction.single_shot_limit,
        config.extraction.chunk_size
    );
    tracing::info!("  - Database: {}", config.database.path.display());

    if config.llm.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; extraction calls will be rejected");
    }

    let server = ExtractorServer::new(config)?;

    // Check the LLM endpoint
    let llm = server.state().pipeline().llm();
    match llm.health_check().await {
        Ok(true) => tracing::info!("LLM provider '{}' is reachable", llm.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("LLM provider '{}' is not reachable", llm.name());
            tracing::warn!("Check OPENAI_BASE_URL and OPENAI_API_KEY");
        }
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/auth/login          - Start a session");
    println!("  POST /api/pdf/extract         - Extract one PDF");
    println!("  POST /api/pdf/extract-batch   - Queue up to 10 PDFs");
    println!("  GET  /api/pdf/queue/status    - Queue counts");
    println!("  GET  /api/pdf/all             - List records");
    println!("  GET  /api/pdf/:id/csv         - Download a record as CSV");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
