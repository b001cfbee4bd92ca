use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill::api::{create_router, AppState};
use quill::config::Config;
use quill::db::{Database, LibSqlBackend, NoteStore};
use quill::llm::NoteGenerator;
use quill::ocr::TextExtractor;
use quill::pipeline::NotePipeline;
use quill::storage::ImageStore;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Turn images of notes into organized study notes")]
struct Args {
    /// Override the listen port from QUILL_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Initializing database...");
    let db = Database::new(&config.database).await?;
    let store: Arc<dyn NoteStore> = Arc::new(LibSqlBackend::new(db));

    tracing::info!(languages = %config.ocr.languages, "Initializing OCR engine...");
    let extractor = Arc::new(TextExtractor::new(config.ocr.clone()));
    if let Err(error) = extractor.initialize().await {
        tracing::warn!(
            error = %error,
            "OCR engine failed to initialize - will retry on first upload"
        );
    }

    let generator = match &config.llm {
        Some(llm_config) => {
            tracing::info!(model = %llm_config.model, "Initializing note generator...");
            match NoteGenerator::new(llm_config) {
                Ok(generator) => Some(Arc::new(generator)),
                Err(error) => {
                    tracing::warn!(error = %error, "note generator unavailable - uploads will fail");
                    None
                }
            }
        }
        None => {
            tracing::warn!("LLM_MODEL is not set - uploads will fail until an LLM is configured");
            None
        }
    };

    let images = ImageStore::new(&config.upload).await?;
    let pipeline = Arc::new(NotePipeline::new(
        Arc::clone(&extractor),
        generator.clone(),
        Arc::clone(&store),
        images,
    ));

    let state = AppState::new(config.clone(), store, Arc::clone(&pipeline), generator);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Quill starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/health", addr);
    tracing::info!("  Process:      http://{}/notes/process", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");
    pipeline.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
