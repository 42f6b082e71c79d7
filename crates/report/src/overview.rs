//! Report overview pipeline: validate the upload, extract text, detect lipid values, interpret
//! them, open a report session and optionally ask an LLM for a summary.

use crate::detect::detect_lipids;
use crate::error::{ReportError, ReportResult};
use crate::pdf::{has_pdf_extension, PdfTextExtractor, TextExtractor};
use crate::summary::SummaryProvider;
use lipid_core::{LipidEngine, SessionStore};
use lipid_types::AnswerResult;
use serde_json::Value;
use std::sync::Arc;

/// Characters of extracted text echoed back to the caller.
pub const TEXT_PREVIEW_CHARS: usize = 500;

pub const MSG_REPORT_READ: &str = "pdf uploaded and text extracted";
pub const MSG_NO_LIPIDS: &str = "no lipid values found in report";
const WARN_NO_LIPIDS: &str = "no CHOL, LDL, HDL, or TG values were detected";
const WARN_NO_TEXT: &str = "no text layer found in pdf; scanned reports are not supported";

/// Outcome of processing one uploaded report.
#[derive(Debug, Clone)]
pub struct ReportOverview {
    pub is_valid_report: bool,
    pub message: String,
    pub report_id: Option<String>,
    pub text_preview: String,
    /// Detected values keyed by code, in report order.
    pub lipids: serde_json::Map<String, Value>,
    pub interpretation: AnswerResult,
    pub summary: Option<String>,
    pub warnings: Vec<String>,
}

/// Processes uploaded reports.
pub struct ReportPipeline {
    engine: Arc<LipidEngine>,
    sessions: Arc<dyn SessionStore>,
    extractor: Arc<dyn TextExtractor>,
    summariser: Option<SummaryProvider>,
    max_upload_bytes: usize,
}

impl ReportPipeline {
    pub fn new(
        engine: Arc<LipidEngine>,
        sessions: Arc<dyn SessionStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            engine,
            sessions,
            extractor: Arc::new(PdfTextExtractor),
            summariser: None,
            max_upload_bytes,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_summariser(mut self, summariser: Option<SummaryProvider>) -> Self {
        self.summariser = summariser;
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn engine(&self) -> &LipidEngine {
        &self.engine
    }

    /// Checks the file name, size and emptiness of an upload, in that order.
    pub fn validate_upload(&self, filename: &str, bytes: &[u8]) -> ReportResult<()> {
        if !has_pdf_extension(filename) {
            return Err(ReportError::UnsupportedFileType);
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(ReportError::TooLarge {
                max_mb: self.max_upload_bytes / (1024 * 1024),
            });
        }
        if bytes.is_empty() {
            return Err(ReportError::EmptyFile);
        }
        Ok(())
    }

    /// Runs the whole pipeline for one upload.
    ///
    /// # Errors
    /// Validation and extraction failures are errors. A failed summary request is not; it is
    /// reported as a warning on an otherwise complete overview.
    pub async fn analyse(&self, filename: &str, bytes: Vec<u8>) -> ReportResult<ReportOverview> {
        self.validate_upload(filename, &bytes)?;

        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
            .await
            .map_err(|e| ReportError::ExtractionTask(e.to_string()))??;

        let text = text.trim();
        let detection = detect_lipids(text);
        let panel = detection.panel();
        let interpretation = self.engine.summarise(&panel);
        let mut warnings = detection.warnings;

        tracing::info!(
            filename,
            chars = text.chars().count(),
            detected = panel.len(),
            "report text processed"
        );

        if panel.is_empty() {
            if text.is_empty() {
                warnings.push(WARN_NO_TEXT.to_string());
            }
            warnings.push(WARN_NO_LIPIDS.to_string());
            return Ok(ReportOverview {
                is_valid_report: false,
                message: MSG_NO_LIPIDS.to_string(),
                report_id: None,
                text_preview: preview(text),
                lipids: serde_json::Map::new(),
                interpretation,
                summary: None,
                warnings,
            });
        }

        let report_id = self.sessions.create(panel.clone())?;

        let summary = match &self.summariser {
            Some(provider) => match provider.summarise(&interpretation.details).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), "summary request failed: {e}");
                    warnings.push(format!("summary unavailable: {e}"));
                    None
                }
            },
            None => None,
        };

        Ok(ReportOverview {
            is_valid_report: true,
            message: MSG_REPORT_READ.to_string(),
            report_id: Some(report_id),
            text_preview: preview(text),
            lipids: panel.to_json_map(),
            interpretation,
            summary,
            warnings,
        })
    }
}

fn preview(text: &str) -> String {
    text.chars().take(TEXT_PREVIEW_CHARS).collect()
}
