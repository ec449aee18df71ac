use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veracity::api::{create_router, AppState};
use veracity::config::Config;
use veracity::correction::CorrectionService;
use veracity::db::{CorrectionLogStore, Database, DatabaseBackend, LibSqlBackend};
use veracity::detection::HallucinationDetector;
use veracity::embeddings::{Embedder, EmbeddingProvider, SimilarityScorer};
use veracity::llm::{LlmAnswerGenerator, LlmProvider};
use veracity::nli::NliProvider;
use veracity::retrieval::{PassageRetriever, WikipediaClient};
use veracity::services::HallucinationPipeline;

/// Embedded replicas pull from the primary this often.
const REPLICA_SYNC_INTERVAL_SECS: u64 = 60;

#[derive(Parser)]
#[command(name = "veracity")]
#[command(about = "Claim-level hallucination detection for LLM answers")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Check an answer against evidence passages and print the detection report
    Check {
        #[arg(long)]
        answer: String,
        /// Evidence passage; repeat for several
        #[arg(long)]
        evidence: Vec<String>,
    },
    /// Answer, check and correct one question, then print the outcome
    Ask {
        #[arg(long)]
        question: String,
    },
}

struct Runtime {
    pipeline: HallucinationPipeline,
    db: Option<Arc<dyn DatabaseBackend>>,
    llm: LlmProvider,
    correction_llm: LlmProvider,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "veracity=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Loading embedding model: {}...", config.embeddings.model);
    let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingProvider::new(&config.embeddings)?);

    tracing::info!("Loading NLI model: {}...", config.nli.model);
    let nli = Arc::new(NliProvider::new(&config.nli)?);

    let detector = Arc::new(HallucinationDetector::new(
        nli,
        embedder.clone(),
        config.detection,
    ));

    match args.command.unwrap_or(Command::Serve) {
        Command::Check { answer, evidence } => {
            let result = detector.detect(&answer, &evidence).await?;
            println!("{}", serde_json::to_string_pretty(&result.to_report())?);
            Ok(())
        }
        Command::Ask { question } => {
            let runtime = build_runtime(&config, detector, embedder).await?;
            let outcome = runtime.pipeline.run(&question).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Command::Serve => {
            let runtime = build_runtime(&config, detector, embedder).await?;
            serve(config, runtime).await
        }
    }
}

async fn build_runtime(
    config: &Config,
    detector: Arc<HallucinationDetector>,
    embedder: Arc<dyn Embedder>,
) -> anyhow::Result<Runtime> {
    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - every question will end in a generation error");
    }

    let correction_llm = LlmProvider::new(config.correction.as_ref());
    if !correction_llm.is_available() {
        tracing::warn!("Correction LLM unavailable - flagged answers cannot be corrected");
    }

    let scorer = SimilarityScorer::new(embedder);
    let source = Arc::new(WikipediaClient::new(&config.retrieval)?);
    let retriever = Arc::new(PassageRetriever::new(
        source,
        scorer.clone(),
        config.retrieval.clone(),
    ));
    let corrector = Arc::new(CorrectionService::new(correction_llm.clone(), scorer));
    let generator = Arc::new(LlmAnswerGenerator::new(llm.clone()));

    let mut pipeline = HallucinationPipeline::new(generator, retriever, detector, corrector);

    let db = if config.database.logging_enabled {
        tracing::info!("Initializing database...");
        let backend = Arc::new(LibSqlBackend::new(Database::new(&config.database).await?));
        let store: Arc<dyn CorrectionLogStore> = backend.clone();
        pipeline = pipeline.with_log_store(store);
        let db: Arc<dyn DatabaseBackend> = backend;
        Some(db)
    } else {
        tracing::info!("Correction logging disabled");
        None
    };

    Ok(Runtime {
        pipeline,
        db,
        llm,
        correction_llm,
    })
}

async fn serve(config: Config, runtime: Runtime) -> anyhow::Result<()> {
    let cancel_token = CancellationToken::new();

    if let (Some(db), Some(_)) = (&runtime.db, &config.database.local_path) {
        tracing::info!("Starting replica sync (every {}s)...", REPLICA_SYNC_INTERVAL_SECS);
        let db = db.clone();
        let token = cancel_token.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Replica sync shutting down...");
                        break;
                    }
                    _ = tokio::time::sleep(tokio::time::Duration::from_secs(REPLICA_SYNC_INTERVAL_SECS)) => {
                        if let Err(e) = db.sync().await {
                            tracing::error!("Replica sync error: {}", e);
                        }
                    }
                }
            }
        });
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(
        config,
        runtime.pipeline,
        runtime.db,
        runtime.llm,
        runtime.correction_llm,
    );
    let app = create_router(state);

    tracing::info!("Veracity starting on http://{}", addr);
    tracing::info!("  Detect:       POST http://{}/api/v1/detect_hallucination", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
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

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
