use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formlab_api::{build_router, ApiConfig, AppState};
use formlab_jobs::{
    AnalysisPipeline, FileResultStore, InMemoryJobStore, PipelineConfig, PipelineEvent,
    PoseSourceConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "formlab_api=debug,formlab_jobs=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "formlab_api=debug,formlab_jobs=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("formlab-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ApiConfig::from_env();
    std::fs::create_dir_all(&config.upload_dir)?;
    let results = FileResultStore::open(&config.results_dir)?;

    let pose_config = PoseSourceConfig::from_env();
    let pose = pose_config.build()?;
    let pipeline_config = PipelineConfig::from_env();
    info!(
        pose_source = pose.name(),
        max_concurrent = pipeline_config.admission.max_concurrent,
        stale_after_secs = pipeline_config.admission.stale_after.as_secs(),
        upload_dir = %config.upload_dir.display(),
        results_dir = %config.results_dir.display(),
        "Pipeline configured"
    );

    let pipeline = AnalysisPipeline::new(
        pipeline_config,
        Arc::new(InMemoryJobStore::new()),
        Arc::new(results),
        pose,
    );

    // Mirror pipeline events into the log.
    let mut events = pipeline.events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PipelineEvent::JobProgress { job_id, percent }) => {
                    debug!(job_id = %job_id, progress = percent, "Pipeline event: progress")
                }
                Ok(event) => debug!(?event, "Pipeline event"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Pipeline event log lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app = build_router(AppState::new(config, pipeline));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
