use api_rest::{chat_router, report_router, AppState};
use lipid_core::ServiceConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the lipid explainer
///
/// Starts both HTTP services concurrently over one shared state:
/// - chat API on port 8001 (configurable via CHAT_ADDR)
/// - report-overview API on port 8002 (configurable via REPORT_ADDR)
///
/// # Environment Variables
/// - `CHAT_ADDR`, `REPORT_ADDR`: listen addresses
/// - `LIPID_REFERENCE_CSV`: reference dataset path
/// - `CHAT_DB_PATH`: SQLite chat history path
/// - `LLM_PROVIDER`, `OPENAI_API_KEY`, `GEMINI_API_KEY`, `LLM_MODEL`: summary provider
/// - `CHAT_MODE`, `MAX_UPLOAD_MB`, `SESSION_TTL_SECS`
///
/// # Returns
/// * `Ok(())` - If servers start and run successfully
/// * `Err(anyhow::Error)` - If configuration, startup or a server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lipid=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServiceConfig::from_lookup(|key| std::env::var(key).ok())?;
    let state = AppState::from_config(&cfg)?;

    tracing::info!("++ Starting chat API on {}", cfg.chat_addr());
    tracing::info!("++ Starting report-overview API on {}", cfg.report_addr());

    let chat_listener = tokio::net::TcpListener::bind(cfg.chat_addr()).await?;
    let report_listener = tokio::net::TcpListener::bind(cfg.report_addr()).await?;

    let chat_app = chat_router(state.clone());
    let chat_server = tokio::spawn(async move { axum::serve(chat_listener, chat_app).await });

    let report_app = report_router(state);
    let report_server = tokio::spawn(async move { axum::serve(report_listener, report_app).await });

    let (chat_result, report_result) = tokio::join!(chat_server, report_server);
    chat_result??;
    report_result??;

    Ok(())
}
