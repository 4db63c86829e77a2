use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use oarss::{
    AppState, Config, Database, FeedSynthesizer, FetchPipeline, HttpContentSource, Scheduler,
    WebServer,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = oarss::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        oarss::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> oarss::Result<()> {
    info!("oarss {} starting", env!("CARGO_PKG_VERSION"));
    info!("Feeds published under {}", config.public_host());

    let db = Database::open(&config.database.path).await?;
    let source = Arc::new(HttpContentSource::new(&config.upstream)?);

    let pipeline = FetchPipeline::from_config(db.clone(), source, &config);
    let synthesizer = FeedSynthesizer::from_config(db, pipeline.codec().clone(), &config.rss);
    let scheduler = Arc::new(Scheduler::new(pipeline.clone(), &config.scheduler));

    let config = Arc::new(config);
    let state = Arc::new(AppState::new(
        pipeline,
        Arc::clone(&scheduler),
        synthesizer,
        Arc::clone(&config),
    ));
    let server = WebServer::new(&config.server, state)?;

    scheduler.start().await;

    let result = server.run(shutdown_signal()).await;

    scheduler.stop().await;
    info!("Shutdown complete");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
