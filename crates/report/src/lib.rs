//! # Lipid Report
//!
//! Turns an uploaded lab report PDF into an interpreted lipid overview.
//!
//! - [`pdf`]: text extraction from digital PDFs
//! - [`detect`]: line-based detection of CHOL, LDL, HDL and TG values
//! - [`summary`]: optional plain-language summaries from OpenAI or Gemini
//! - [`overview`]: the upload pipeline tying these to the core engine and session store

pub mod detect;
mod error;
pub mod overview;
pub mod pdf;
pub mod summary;

pub use detect::{detect_lipids, DetectedValue, Detection};
pub use error::{ReportError, ReportResult, SummaryError};
pub use overview::{ReportOverview, ReportPipeline};
pub use pdf::{PdfTextExtractor, TextExtractor};
pub use summary::SummaryProvider;
