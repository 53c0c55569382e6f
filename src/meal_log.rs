// 📝 Log Store - Append-only history of consumed meals

use chrono::NaiveDateTime;
use std::path::Path;
use tracing::info;

use crate::category::MealCategory;
use crate::db::{CsvTable, Loaded, LogEntry};
use crate::error::{Result, ValidationError};

pub struct LogStore {
    table: CsvTable<LogEntry>,
}

impl LogStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        LogStore {
            table: CsvTable::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.table.path()
    }

    pub fn load(&self) -> Result<Loaded<LogEntry>> {
        self.table.load()
    }

    pub fn save(&self, entries: &[LogEntry]) -> Result<()> {
        self.table.save(entries)
    }

    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        Ok(self.load()?.rows)
    }

    /// Append one consumed meal. Quantity must be positive and finite.
    pub fn append(
        &self,
        timestamp: NaiveDateTime,
        category: MealCategory,
        name: &str,
        quantity: f64,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyMealName.into());
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ValidationError::NonPositiveQuantity(quantity).into());
        }

        let mut entries = self.entries()?;
        entries.push(LogEntry {
            timestamp,
            category,
            name: name.to_string(),
            quantity,
        });
        self.save(&entries)?;
        info!("Logged {} x {} ({})", quantity, name, category);
        Ok(())
    }

    /// Last `limit` entries in insertion order, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self.entries()?.into_iter().rev().take(limit).collect())
    }
}
