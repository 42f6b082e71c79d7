//! Chat history persistence.
//!
//! Every answered question is appended to a single SQLite table. A connection is opened per
//! operation, which keeps the store `Send + Sync` without a connection pool; SQLite serialises
//! concurrent writers itself.

use crate::{LipidError, LipidResult};
use lipid_types::{AnswerResult, NonEmptyText};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chat_messages (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id TEXT NOT NULL,
  created_at TEXT NOT NULL DEFAULT (datetime('now')),
  question TEXT NOT NULL,
  answer TEXT NOT NULL,
  mode TEXT,
  sources_json TEXT,
  highlights_json TEXT
);
CREATE INDEX IF NOT EXISTS idx_chat_user_time ON chat_messages(user_id, created_at);
";

/// A stored question/answer exchange.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub mode: String,
    pub sources: Vec<String>,
    pub highlights: Vec<String>,
    pub created_at: Option<String>,
}

/// SQLite-backed chat history.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    db_path: PathBuf,
}

impl ChatHistory {
    /// Prepares the history database at `db_path`, creating parent directories and the schema
    /// if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the schema cannot be applied.
    pub fn open(db_path: impl Into<PathBuf>) -> LipidResult<Self> {
        let history = Self {
            db_path: db_path.into(),
        };
        if let Some(parent) = history.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(LipidError::HistoryDirCreation)?;
            }
        }
        history.connect()?.execute_batch(SCHEMA)?;
        tracing::info!("chat history ready at {}", history.db_path.display());
        Ok(history)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> LipidResult<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Appends an exchange and returns its row id.
    pub fn record(
        &self,
        user_id: &NonEmptyText,
        question: &str,
        result: &AnswerResult,
    ) -> LipidResult<i64> {
        let sources_json =
            serde_json::to_string(&result.sources).map_err(LipidError::Serialization)?;
        let highlights_json =
            serde_json::to_string(&result.highlights).map_err(LipidError::Serialization)?;

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO chat_messages (user_id, question, answer, mode, sources_json, highlights_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id.as_str(),
                question,
                result.answer,
                result.mode.as_str(),
                sources_json,
                highlights_json,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recent `limit` exchanges for `user_id`, oldest first.
    pub fn recent(&self, user_id: &NonEmptyText, limit: u32) -> LipidResult<Vec<HistoryEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, question, answer, mode, sources_json, highlights_json, created_at
             FROM chat_messages
             WHERE user_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id.as_str(), limit], |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                question: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                answer: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                mode: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                sources: decode_list(row.get::<_, Option<String>>(4)?),
                highlights: decode_list(row.get::<_, Option<String>>(5)?),
                created_at: row.get(6)?,
            })
        })?;

        let mut entries = rows.collect::<Result<Vec<_>, _>>()?;
        entries.reverse();
        Ok(entries)
    }
}

/// Decodes a JSON string list column. Missing or malformed values read as an empty list.
fn decode_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}
