use anyhow::Context;
use background_service::{FetchEngine, PeriodicReporter};
use reddit_client::RedditClient;
use stats_core::{AppConfig, PostAggregate};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "reddit_stats=info,background_service=info,reddit_client=info,web_api=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("Starting Reddit Stats");

    let config = AppConfig::load(None).context("failed to load configuration")?;

    let client = RedditClient::from_config(&config.reddit).context("failed to build Reddit client")?;
    let aggregate = Arc::new(PostAggregate::new());
    let engine = Arc::new(FetchEngine::new(Arc::new(client), aggregate));

    let cancel = CancellationToken::new();

    let reporter = PeriodicReporter::new(engine.clone(), config.reporter.clone());
    let status = reporter.subscribe();
    let reporter_task = tokio::spawn(reporter.run(cancel.clone()));

    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), cancel.clone()));

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!("Listening on {}", config.server.bind);

    axum::serve(listener, web_api::build_router(engine))
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await
        .context("HTTP server error")?;

    // The server can also stop on its own; make sure the reporter follows.
    cancel.cancel();
    if let Err(e) = reporter_task.await {
        tracing::error!("Reporter task panicked: {}", e);
    }

    let last = status.borrow().clone();
    tracing::info!(
        ticks = last.ticks,
        state = ?last.state,
        "Reddit Stats stopped"
    );
    Ok(())
}

/// Cancel `cancel` once `signal` fires. If the handler could not be
/// installed, keep running; the process then stops only by being killed.
async fn cancel_on_signal<F>(signal: F, cancel: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Shutdown requested");
            cancel.cancel();
        }
        Err(e) => tracing::error!(
            "Failed to listen for Ctrl-C, graceful shutdown disabled: {}",
            e
        ),
    }
}
