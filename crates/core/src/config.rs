//! Service runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services. Request
//! handlers never read process-wide environment variables, which keeps behaviour consistent in
//! multi-threaded runtimes and test harnesses.

use crate::constants::*;
use crate::{LipidError, LipidResult};
use lipid_types::Mode;
use std::path::PathBuf;
use std::time::Duration;

/// External LLM used for report summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    pub fn credential_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => OPENAI_API_KEY_VAR,
            LlmProvider::Gemini => GEMINI_API_KEY_VAR,
        }
    }
}

/// Configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    chat_addr: String,
    report_addr: String,
    reference_csv: PathBuf,
    chat_db_path: PathBuf,
    llm_provider: LlmProvider,
    llm_api_key: Option<String>,
    llm_model: Option<String>,
    requested_mode: Mode,
    max_upload_bytes: usize,
    session_ttl: Duration,
}

impl ServiceConfig {
    /// Resolves configuration from a key lookup, normally `std::env::var`.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for unknown providers or modes and for non-positive numbers.
    pub fn from_lookup<F>(lookup: F) -> LipidResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let llm_provider = llm_provider_from_env_value(get("LLM_PROVIDER"))?;
        let max_upload_mb = positive_from_env_value::<usize>(
            "MAX_UPLOAD_MB",
            get("MAX_UPLOAD_MB"),
            DEFAULT_MAX_UPLOAD_MB,
        )?;
        let session_ttl_secs = positive_from_env_value::<u64>(
            "SESSION_TTL_SECS",
            get("SESSION_TTL_SECS"),
            DEFAULT_SESSION_TTL_SECS,
        )?;

        Ok(Self {
            chat_addr: get("CHAT_ADDR").unwrap_or_else(|| DEFAULT_CHAT_ADDR.into()),
            report_addr: get("REPORT_ADDR").unwrap_or_else(|| DEFAULT_REPORT_ADDR.into()),
            reference_csv: get("LIPID_REFERENCE_CSV")
                .unwrap_or_else(|| DEFAULT_REFERENCE_CSV.into())
                .into(),
            chat_db_path: get("CHAT_DB_PATH")
                .unwrap_or_else(|| DEFAULT_CHAT_DB_PATH.into())
                .into(),
            llm_api_key: get(llm_provider.credential_var()),
            llm_model: get("LLM_MODEL"),
            llm_provider,
            requested_mode: chat_mode_from_env_value(get("CHAT_MODE"))?,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }

    pub fn chat_addr(&self) -> &str {
        &self.chat_addr
    }

    pub fn report_addr(&self) -> &str {
        &self.report_addr
    }

    pub fn reference_csv(&self) -> &PathBuf {
        &self.reference_csv
    }

    pub fn chat_db_path(&self) -> &PathBuf {
        &self.chat_db_path
    }

    pub fn llm_provider(&self) -> LlmProvider {
        self.llm_provider
    }

    pub fn llm_api_key(&self) -> Option<&str> {
        self.llm_api_key.as_deref()
    }

    /// Model override for the summary provider; `None` uses the provider default.
    pub fn llm_model(&self) -> Option<&str> {
        self.llm_model.as_deref()
    }

    pub fn has_llm_credential(&self) -> bool {
        self.llm_api_key.is_some()
    }

    /// Mode requested via `CHAT_MODE`. The engine still downgrades to deterministic without a
    /// credential.
    pub fn requested_mode(&self) -> Mode {
        self.requested_mode
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn max_upload_mb(&self) -> usize {
        self.max_upload_bytes / (1024 * 1024)
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn with_reference_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_csv = path.into();
        self
    }

    pub fn with_chat_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chat_db_path = path.into();
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            chat_addr: DEFAULT_CHAT_ADDR.into(),
            report_addr: DEFAULT_REPORT_ADDR.into(),
            reference_csv: DEFAULT_REFERENCE_CSV.into(),
            chat_db_path: DEFAULT_CHAT_DB_PATH.into(),
            llm_provider: LlmProvider::OpenAi,
            llm_api_key: None,
            llm_model: None,
            requested_mode: Mode::Hybrid,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

/// Parse the LLM provider from an optional string value. Absent means OpenAI.
pub fn llm_provider_from_env_value(value: Option<String>) -> LipidResult<LlmProvider> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("openai") => Ok(LlmProvider::OpenAi),
        Some("gemini") => Ok(LlmProvider::Gemini),
        Some(other) => Err(LipidError::InvalidConfig {
            key: "LLM_PROVIDER",
            reason: format!("unknown provider '{other}' (expected openai or gemini)"),
        }),
    }
}

/// Parse the requested chat mode from an optional string value. Absent means hybrid.
pub fn chat_mode_from_env_value(value: Option<String>) -> LipidResult<Mode> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("hybrid") => Ok(Mode::Hybrid),
        Some("deterministic") => Ok(Mode::Deterministic),
        Some(other) => Err(LipidError::InvalidConfig {
            key: "CHAT_MODE",
            reason: format!("unknown mode '{other}' (expected hybrid or deterministic)"),
        }),
    }
}

fn positive_from_env_value<T>(key: &'static str, value: Option<String>, default: T) -> LipidResult<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(LipidError::InvalidConfig {
            key,
            reason: format!("expected a positive integer, got '{raw}'"),
        }),
    }
}
