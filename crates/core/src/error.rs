#[derive(Debug, thiserror::Error)]
pub enum LipidError {
    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("failed to open reference dataset {path}: {source}", path = path.display())]
    ReferenceOpen {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse reference dataset: {0}")]
    ReferenceParse(#[from] csv::Error),
    #[error("reference dataset has no test code column")]
    ReferenceMissingCodeColumn,

    #[error("failed to create history directory: {0}")]
    HistoryDirCreation(std::io::Error),
    #[error("chat history database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("failed to serialize history field: {0}")]
    Serialization(serde_json::Error),

    #[error("session store lock poisoned")]
    SessionLockPoisoned,
}

pub type LipidResult<T> = std::result::Result<T, LipidError>;
