// 🔔 Notification Store - Append-only audit trail of state changes and failures

use chrono::NaiveDateTime;
use std::path::Path;

use crate::db::{CsvTable, Loaded, NotificationEntry, NotificationKind};
use crate::error::Result;

/// How many notifications the feed shows before "show all"
pub const FEED_SIZE: usize = 5;

pub struct NotificationStore {
    table: CsvTable<NotificationEntry>,
}

impl NotificationStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        NotificationStore {
            table: CsvTable::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.table.path()
    }

    pub fn load(&self) -> Result<Loaded<NotificationEntry>> {
        self.table.load()
    }

    pub fn save(&self, entries: &[NotificationEntry]) -> Result<()> {
        self.table.save(entries)
    }

    pub fn entries(&self) -> Result<Vec<NotificationEntry>> {
        Ok(self.load()?.rows)
    }

    pub fn append(&self, timestamp: NaiveDateTime, kind: NotificationKind, message: &str) -> Result<()> {
        let mut entries = self.entries()?;
        entries.push(NotificationEntry {
            timestamp,
            kind,
            message: message.to_string(),
        });
        self.save(&entries)
    }

    /// Full history, newest first. Equal timestamps: later rows first.
    pub fn history(&self) -> Result<Vec<NotificationEntry>> {
        let mut entries = self.entries()?;
        entries.reverse();
        // stable sort keeps the reversed insertion order for ties
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// The `limit` newest notifications
    pub fn latest(&self, limit: usize) -> Result<Vec<NotificationEntry>> {
        let mut history = self.history()?;
        history.truncate(limit);
        Ok(history)
    }
}
