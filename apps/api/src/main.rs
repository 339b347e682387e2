mod analysis;
mod config;
mod db;
mod errors;
mod launcher;
mod llm_client;
mod routes;
mod state;
mod ui;

use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::analyzer::JobRoleAnalyzer;
use crate::analysis::embeddings::{EmbeddingProvider, HashingEmbeddingProvider, HttpEmbeddingProvider};
use crate::analysis::similarity::SimilarityChecker;
use crate::analysis::store::ensure_schema;
use crate::config::{Config, EmbeddingBackend};
use crate::db::create_pool;
use crate::launcher::{wait_for_llm, WaitPolicy};
use crate::llm_client::{CompletionClient, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::ui::controller::{AnalyzeView, SubmitOutcome};
use crate::ui::form::FormFields;
use crate::ui::notify::StderrNotifier;
use crate::ui::transport::HttpTransport;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (page, form fallback, and JSON API).
    Serve(ServeArgs),
    /// Submit one job description to a running server and print the result.
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Overrides PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Probe attempts before giving up on the LLM endpoint (0 = forever).
    #[arg(long, default_value_t = 10)]
    llm_attempts: u32,

    /// Seconds between probe attempts.
    #[arg(long, default_value_t = 3.0)]
    llm_interval: f64,

    #[arg(long, default_value_t = false)]
    skip_llm_check: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server: String,

    #[arg(long)]
    job_title: String,

    #[arg(long)]
    job_description: String,

    /// Sent as a JSON number; anything non-numeric is rejected before the request.
    #[arg(long)]
    years: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await.map(|_| ExitCode::SUCCESS),
        Commands::Analyze(args) => analyze(args).await,
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), default_level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(args: ServeArgs) -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;
    init_tracing(&config.rust_log);

    info!("Starting role-analyzer v{}", env!("CARGO_PKG_VERSION"));

    if args.skip_llm_check {
        info!("Skipping LLM reachability check");
    } else {
        let policy = WaitPolicy::new(args.llm_interval, args.llm_attempts)?;
        wait_for_llm(&config.llm.base_url, policy).await?;
    }

    // Initialize SQLite
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize LLM client
    let llm = LlmClient::new(&config.llm)?;
    info!(
        "LLM client initialized ({}, model: {})",
        llm.base_url(),
        llm.model().unwrap_or("server default")
    );
    let llm: Arc<dyn CompletionClient> = Arc::new(llm);

    let embeddings: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
        EmbeddingBackend::Hashing => Arc::new(HashingEmbeddingProvider),
        EmbeddingBackend::Http => Arc::new(HttpEmbeddingProvider::new(
            &config.llm,
            config.embedding_model.clone(),
        )?),
    };
    info!("Embedding backend: {:?}", config.embedding_backend);

    let similarity = SimilarityChecker::new(
        db.clone(),
        embeddings,
        config.analyzer.similarity_threshold,
        &config.analyzer.similarity_backend,
    )?;
    let analyzer = Arc::new(JobRoleAnalyzer::new(
        db.clone(),
        llm,
        similarity,
        config.analyzer.clone(),
    ));

    let state = AppState { db, analyzer };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", args.host, port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    init_tracing("warn");

    let fields = FormFields::from_pairs([
        ("job_title", args.job_title),
        ("job_description", args.job_description),
        ("years_of_experience", args.years),
    ]);

    let transport = HttpTransport::new(&args.server);
    info!("Submitting to {}", transport.endpoint());

    let mut view = AnalyzeView::init(transport, StderrNotifier, Utc::now().year());
    match view.submit(fields).await {
        SubmitOutcome::Rendered(_) => {
            print!("{}", view.page().results_as_text());
            Ok(ExitCode::SUCCESS)
        }
        SubmitOutcome::Failed(_) | SubmitOutcome::Ignored => Ok(ExitCode::FAILURE),
    }
}
