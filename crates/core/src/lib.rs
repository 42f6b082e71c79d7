//! # Lipid Core
//!
//! Core business logic for the lipid report explainer.
//!
//! This crate contains the interpretation engine and the data it relies on:
//! - Reading normalisation, threshold classification and answer composition
//! - The reference dataset used to ground answers
//! - Chat history (SQLite) and report sessions
//! - Startup configuration
//!
//! **No API concerns**: HTTP servers, multipart handling and OpenAPI documentation belong in
//! `api-rest` and `api-shared`.

pub mod classify;
pub mod config;
pub mod constants;
pub mod engine;
mod error;
pub mod history;
pub mod normalize;
pub mod reference;
pub mod session;

pub use config::{LlmProvider, ServiceConfig};
pub use engine::LipidEngine;
pub use error::{LipidError, LipidResult};
pub use history::{ChatHistory, HistoryEntry};
pub use normalize::{LipidPanel, LipidReading};
pub use reference::{ReferenceDataset, ReferenceRow};
pub use session::{InMemorySessionStore, SessionStore};

// Domain value types are defined in `lipid-types` and re-exported for convenience.
pub use lipid_types::{AnswerResult, Category, LipidCode, LipidDetail, Mode, NonEmptyText};

/// Builds the chat engine described by `cfg` over an already loaded dataset.
///
/// The engine reports `hybrid` only when the selected provider's key is present and
/// `CHAT_MODE` did not ask for deterministic answers.
pub fn engine_from_config(
    cfg: &ServiceConfig,
    reference: std::sync::Arc<ReferenceDataset>,
) -> LipidEngine {
    let engine = LipidEngine::new(reference, cfg.has_llm_credential())
        .with_credential_name(cfg.llm_provider().credential_var());
    if cfg.requested_mode() == Mode::Deterministic {
        engine.force_deterministic()
    } else {
        engine
    }
}
