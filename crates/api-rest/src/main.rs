//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the chat and report-overview REST services without the rest of the workspace tooling.
//!
//! ## Intended use
//! Useful for development and debugging when you want to start the APIs from the `api-rest`
//! crate directly. The workspace's main `lipid-run` binary does the same from the root.

use api_rest::{chat_router, report_router, AppState};
use lipid_core::ServiceConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the standalone REST server
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration from the environment is invalid,
/// - chat history cannot be opened,
/// - either address cannot be bound, or
/// - an HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServiceConfig::from_lookup(|key| std::env::var(key).ok())?;
    let state = AppState::from_config(&cfg)?;

    tracing::info!("-- Starting chat API on {}", cfg.chat_addr());
    tracing::info!("-- Starting report-overview API on {}", cfg.report_addr());

    let chat_listener = tokio::net::TcpListener::bind(cfg.chat_addr()).await?;
    let report_listener = tokio::net::TcpListener::bind(cfg.report_addr()).await?;

    let chat_app = chat_router(state.clone());
    let report_app = report_router(state);
    let (chat_result, report_result) = tokio::join!(
        async move { axum::serve(chat_listener, chat_app).await },
        async move { axum::serve(report_listener, report_app).await },
    );
    chat_result?;
    report_result?;

    Ok(())
}
