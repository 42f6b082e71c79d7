//! Request and response bodies for both HTTP services.

use lipid_types::{LipidDetail, Mode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RootRes {
    pub message: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    #[schema(value_type = Object)]
    pub detail: Value,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AskReq {
    #[schema(example = "Is my LDL high?")]
    pub question: String,
    /// Readings keyed by label; values may be numbers or numeric strings.
    #[serde(default)]
    #[schema(value_type = Option<Object>, example = json!({"LDL": 145, "HDL": "38"}))]
    pub lipids: Option<Map<String, Value>>,
    /// Report session to read readings from when `lipids` is empty.
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Number of exchanges to return, 1 to 200.
    pub limit: Option<i64>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub mode: String,
    pub sources: Vec<String>,
    pub highlights: Vec<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryRes {
    /// Oldest first.
    pub items: Vec<HistoryItem>,
    pub count: usize,
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// Report overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadRes {
    pub is_valid_report: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub text_preview: String,
    #[schema(value_type = Object, example = json!({"LDL": 145.0}))]
    pub lipids: Map<String, Value>,
    pub details: Vec<LipidDetail>,
    pub highlights: Vec<String>,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub mode: Mode,
    /// Set when no LLM credential is configured.
    pub note: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferenceSampleRes {
    pub source: String,
    pub rows_returned: usize,
    pub columns: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Map<String, Value>>,
}

/// Detail body when the reference dataset could not be loaded at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DatasetUnavailable {
    pub message: String,
    pub path: String,
    pub error: Option<String>,
}
