//! Engine output types.

use crate::{Category, LipidCode};

/// Whether an LLM credential was configured when the engine was built.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Deterministic,
    Hybrid,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Deterministic => "deterministic",
            Mode::Hybrid => "hybrid",
        }
    }
}

/// One classified reading, enriched with whatever the reference dataset knows about its code.
///
/// Reference fields are `None` when the dataset is unavailable or has no value for them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct LipidDetail {
    pub code: LipidCode,
    pub value: f64,
    #[schema(value_type = String, example = "borderline-high")]
    pub category: Category,
    pub display_name: Option<String>,
    pub unit: Option<String>,
    pub desirable_range: Option<String>,
    pub borderline_high_range: Option<String>,
    pub high_range: Option<String>,
    pub low_range: Option<String>,
    pub sex_specific_ranges: Option<String>,
}

/// Answer composed by the interpretation engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct AnswerResult {
    pub answer: String,
    pub details: Vec<LipidDetail>,
    /// Deduplicated, in first-seen order.
    pub highlights: Vec<String>,
    pub sources: Vec<String>,
    pub mode: Mode,
    pub note: Option<String>,
}
