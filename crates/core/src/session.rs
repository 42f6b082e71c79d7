//! Report sessions.
//!
//! An uploaded report yields a set of lipid values that later chat questions can refer to by
//! `report_id`. [`SessionStore`] is the seam for where those values live; the in-memory store
//! below expires entries after a fixed time-to-live and loses everything on restart.

use crate::normalize::LipidPanel;
use crate::{LipidError, LipidResult};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Key-value store mapping report ids to lipid panels.
pub trait SessionStore: Send + Sync {
    /// Stores `panel` and returns its newly generated report id.
    fn create(&self, panel: LipidPanel) -> LipidResult<String>;

    /// The panel stored under `report_id`, unless it is unknown or expired.
    fn get(&self, report_id: &str) -> LipidResult<Option<LipidPanel>>;

    /// Drops expired entries and returns how many were removed.
    fn purge_expired(&self) -> LipidResult<usize>;
}

struct SessionEntry {
    panel: LipidPanel,
    expires_at: Instant,
}

/// Process-local session store with time-based expiry.
pub struct InMemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, panel: LipidPanel) -> LipidResult<String> {
        let now = Instant::now();
        let report_id = Uuid::new_v4().to_string();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LipidError::SessionLockPoisoned)?;

        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            report_id.clone(),
            SessionEntry {
                panel,
                expires_at: now + self.ttl,
            },
        );
        tracing::debug!(report_id, live = entries.len(), "report session created");
        Ok(report_id)
    }

    fn get(&self, report_id: &str) -> LipidResult<Option<LipidPanel>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LipidError::SessionLockPoisoned)?;
        Ok(entries
            .get(report_id.trim())
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.panel.clone()))
    }

    fn purge_expired(&self) -> LipidResult<usize> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LipidError::SessionLockPoisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }
}
