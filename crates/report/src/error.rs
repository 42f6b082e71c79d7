use thiserror::Error;

/// Errors raised while turning an uploaded report into an overview.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Only PDF files are supported")]
    UnsupportedFileType,
    #[error("file too large. max {max_mb}mb")]
    TooLarge { max_mb: usize },
    #[error("empty file")]
    EmptyFile,
    #[error("could not extract text from pdf")]
    PdfParsing(String),
    #[error("text extraction task failed: {0}")]
    ExtractionTask(String),
    #[error("failed to store report session: {0}")]
    Session(#[from] lipid_core::LipidError),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;

/// Errors from the external summary providers.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("could not connect to summary provider at {0}")]
    Connection(String),
    #[error("summary request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("summary provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse summary response: {0}")]
    ResponseParsing(String),
    #[error("summary provider returned no text")]
    EmptyResponse,
}
