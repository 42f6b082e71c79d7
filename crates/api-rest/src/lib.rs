//! # API REST
//!
//! REST APIs for the lipid explainer.
//!
//! Handles:
//! - The chat service: questions about lipid values and chat history
//! - The report-overview service: PDF uploads and the reference dataset sample
//! - OpenAPI/Swagger documentation and CORS for both
//!
//! Both services share one [`AppState`], so a `report_id` returned by an upload can be used in
//! a later chat question.

#![warn(rust_2018_idioms)]

pub mod chat;
mod error;
pub mod report;

pub use error::ApiError;

use api_shared::HealthService;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use lipid_core::{
    engine_from_config, ChatHistory, InMemorySessionStore, LipidEngine, ReferenceDataset,
    ServiceConfig, SessionStore,
};
use lipid_report::{ReportPipeline, SummaryProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Slack allowed on top of the upload limit for multipart framing.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state for both services.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<LipidEngine>,
    history: ChatHistory,
    sessions: Arc<dyn SessionStore>,
    pipeline: Arc<ReportPipeline>,
    reference_path: PathBuf,
    reference_error: Option<String>,
}

impl AppState {
    /// Loads the reference dataset, opens chat history and wires up the report pipeline.
    ///
    /// A reference dataset that fails to load is not fatal: answers fall back to thresholds
    /// alone and the reference endpoint reports the error.
    ///
    /// # Errors
    /// Returns an error if chat history cannot be opened or the summary client cannot be built.
    pub fn from_config(cfg: &ServiceConfig) -> anyhow::Result<Self> {
        let (reference, reference_error) = match ReferenceDataset::load(cfg.reference_csv()) {
            Ok(dataset) => (dataset, None),
            Err(e) => {
                tracing::warn!(
                    "lipid reference unavailable at {}: {e}",
                    cfg.reference_csv().display()
                );
                (ReferenceDataset::empty(), Some(e.to_string()))
            }
        };

        let engine = Arc::new(engine_from_config(cfg, Arc::new(reference)));
        let history = ChatHistory::open(cfg.chat_db_path())?;
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(cfg.session_ttl()));

        let summariser = SummaryProvider::from_config(cfg)?;
        match &summariser {
            Some(provider) => tracing::info!(
                provider = provider.name(),
                model = provider.model(),
                "report summaries enabled"
            ),
            None => tracing::info!("report summaries disabled (no LLM key)"),
        }

        let pipeline = ReportPipeline::new(engine.clone(), sessions.clone(), cfg.max_upload_bytes())
            .with_summariser(summariser);

        tracing::info!(mode = engine.mode().as_str(), "chat engine ready");

        Ok(Self {
            engine,
            history,
            sessions,
            pipeline: Arc::new(pipeline),
            reference_path: cfg.reference_csv().clone(),
            reference_error,
        })
    }

    pub fn engine(&self) -> &LipidEngine {
        &self.engine
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    pub fn pipeline(&self) -> &ReportPipeline {
        &self.pipeline
    }
}

/// Router for the chat service.
pub fn chat_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(chat::root))
        .route("/health", get(chat::health))
        .route("/api/chat/ask", post(chat::ask))
        .route("/api/chat/history", get(chat::history))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", chat::ChatApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Router for the report-overview service.
pub fn report_router(state: AppState) -> Router {
    let body_limit = state.pipeline.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES;
    Router::new()
        .route("/health", get(report::health))
        .route("/api/report-overview/upload", post(report::upload))
        .route(
            "/api/report-overview/reference/lipids",
            get(report::reference_sample),
        )
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", report::ReportApiDoc::openapi()),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn chat_health() -> HealthService {
    HealthService::new("chat service")
}

pub(crate) fn report_health() -> HealthService {
    HealthService::new("report overview service")
}
