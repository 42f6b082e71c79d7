//! Constants used throughout the lipid core crate.
//!
//! Thresholds, fixed answer sentences and configuration defaults live here so the engine, the
//! services and the tests agree on a single source of truth.

/// CHOL: below this is desirable.
pub const CHOL_BORDERLINE_FROM: f64 = 200.0;
/// CHOL: at or above this is high.
pub const CHOL_HIGH_FROM: f64 = 240.0;

/// LDL: below this is optimal.
pub const LDL_NEAR_OPTIMAL_FROM: f64 = 100.0;
pub const LDL_BORDERLINE_FROM: f64 = 130.0;
pub const LDL_HIGH_FROM: f64 = 160.0;
pub const LDL_VERY_HIGH_FROM: f64 = 190.0;

/// HDL: below this is low.
pub const HDL_ACCEPTABLE_FROM: f64 = 40.0;
/// HDL: at or above this is protective.
pub const HDL_PROTECTIVE_FROM: f64 = 60.0;

/// TG: below this is normal.
pub const TG_BORDERLINE_FROM: f64 = 150.0;
pub const TG_HIGH_FROM: f64 = 200.0;
pub const TG_VERY_HIGH_FROM: f64 = 500.0;

/// Appended to every answer except the empty-readings reply.
pub const DISCLAIMER: &str = "This is general information, not medical advice.";

/// Prefix of the multi-value answer when at least one value is highlighted.
pub const SUMMARY_PREFIX: &str = "Here's a quick summary of your lipid values. ";

/// Multi-value answer when nothing is highlighted.
pub const NOTHING_STANDS_OUT: &str =
    "Nothing in your lipid values stands out as abnormal based on standard reference thresholds.";

/// Reply when no valid reading survives normalisation.
pub const NO_VALID_READINGS: &str =
    "Please share valid lipid values (CHOL, LDL, HDL, or TG) so I can explain them.";

/// Credential whose absence puts the chat engine in deterministic mode.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Credential used when Gemini is the selected provider.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// User id recorded for chat exchanges that do not name one.
pub const DEFAULT_USER_ID: &str = "default";

/// Default chat history page size.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Largest chat history page a caller may request.
pub const MAX_HISTORY_LIMIT: u32 = 200;

/// Default reference dataset location, relative to the working directory.
pub const DEFAULT_REFERENCE_CSV: &str = "data/rag_lipid_reference_CHOL_LDL_HDL_TG.csv";

/// Default SQLite chat history location, relative to the working directory.
pub const DEFAULT_CHAT_DB_PATH: &str = "data/chat_history.sqlite3";

pub const DEFAULT_CHAT_ADDR: &str = "0.0.0.0:8001";
pub const DEFAULT_REPORT_ADDR: &str = "0.0.0.0:8002";

/// Default upload limit for report PDFs, in MiB.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 10;

/// Default report session lifetime.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
