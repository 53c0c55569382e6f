// 📚 Journal - The three stores behind one handle
//
// Owns the data directory, stamps notifications, surfaces table recovery and
// applies the effects produced by `app::handle`.

use anyhow::Context;
use chrono::{Local, NaiveDateTime, Timelike};
use std::fs;
use tracing::{error, info, warn};

use crate::app::Effect;
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db::{CatalogEntry, Loaded, LogEntry, NotificationEntry, NotificationKind};
use crate::error::{MealError, Result};
use crate::meal_log::LogStore;
use crate::notifications::NotificationStore;

pub struct Journal {
    pub catalog: CatalogStore,
    pub log: LogStore,
    pub notifications: NotificationStore,
}

/// Local wall-clock time, second precision as stored on disk
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

impl Journal {
    /// Open (and create if needed) the tables under `config.data_dir`.
    ///
    /// An unusable data directory is the one fatal startup error.
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", config.data_dir.display())
        })?;

        let journal = Journal {
            catalog: CatalogStore::new(config.catalog_path()),
            log: LogStore::new(config.log_path()),
            notifications: NotificationStore::new(config.notifications_path()),
        };

        // Notifications first so recoveries of the other tables can be recorded
        journal.notification_history()?;
        journal.catalog_entries()?;
        journal.log_entries()?;

        info!("Opened journal in {}", config.data_dir.display());
        Ok(journal)
    }

    /// Record an audit notification stamped now
    pub fn notify(&self, kind: NotificationKind, message: &str) -> Result<()> {
        match kind {
            NotificationKind::Error => error!("{}", message),
            NotificationKind::Warning => warn!("{}", message),
            _ => info!("{}", message),
        }
        self.notifications.append(now(), kind, message)
    }

    pub fn catalog_entries(&self) -> Result<Vec<CatalogEntry>> {
        let loaded = self.catalog.load()?;
        self.surface(loaded)
    }

    pub fn log_entries(&self) -> Result<Vec<LogEntry>> {
        let loaded = self.log.load()?;
        self.surface(loaded)
    }

    /// Newest first
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.log_entries()?;
        self.log.recent(limit)
    }

    /// Newest first
    pub fn notification_history(&self) -> Result<Vec<NotificationEntry>> {
        let loaded = self.notifications.load()?;
        self.surface(loaded)?;
        self.notifications.history()
    }

    /// Apply effects in order.
    ///
    /// A store refusing a write (row changed since the snapshot) is recorded
    /// as an error notification rather than aborting the remaining effects.
    pub fn apply(&self, effects: &[Effect]) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::AppendLog {
                    timestamp,
                    category,
                    name,
                    quantity,
                } => {
                    if let Err(err) = self.log.append(*timestamp, *category, name, *quantity) {
                        self.notify(
                            NotificationKind::Error,
                            &format!("Failed to save meal: {}", err),
                        )?;
                        if !matches!(err, MealError::Validation(_)) {
                            return Err(err);
                        }
                    }
                }
                Effect::AddCatalog { name, category } => {
                    if !self.catalog.add(name, *category)? {
                        self.notify(
                            NotificationKind::Warning,
                            &format!("Meal '{}' already exists in database", name),
                        )?;
                    }
                }
                Effect::UpdateCatalog {
                    old_name,
                    new_name,
                    category,
                } => {
                    if !self.catalog.update(old_name, new_name, *category)? {
                        self.notify(
                            NotificationKind::Error,
                            &format!("Failed to update meal '{}'", old_name),
                        )?;
                    }
                }
                Effect::DeleteCatalog { name } => {
                    if !self.catalog.delete(name)? {
                        self.notify(
                            NotificationKind::Error,
                            &format!("Failed to delete meal '{}'", name),
                        )?;
                    }
                }
                Effect::Notify { kind, message } => self.notify(*kind, message)?,
            }
        }
        Ok(())
    }

    /// Turn a recovered table into a warning notification
    fn surface<R>(&self, loaded: Loaded<R>) -> Result<Vec<R>> {
        if let Some(err) = loaded.recovered {
            self.notify(
                NotificationKind::Warning,
                &format!("{}. Table was reset to an empty one.", err),
            )?;
        }
        Ok(loaded.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{handle, Command, UiState};
    use crate::category::MealCategory;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> Journal {
        Journal::open(&Config::with_data_dir(dir.path())).unwrap()
    }

    #[test]
    fn test_open_creates_all_tables() {
        let dir = TempDir::new().unwrap();
        open(&dir);

        for file in ["meal_catalog.csv", "meal_log.csv", "notifications.csv"] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }
    }

    #[test]
    fn test_corrupt_catalog_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("meal_catalog.csv"), "garbage,here\n1,2\n").unwrap();

        let journal = open(&dir);

        assert!(journal.catalog_entries().unwrap().is_empty());
        let history = journal.notification_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, NotificationKind::Warning);
        assert!(history[0].message.contains("meal_catalog.csv"));
    }

    #[test]
    fn test_corrupt_notifications_recovered_and_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notifications.csv"), "nope\n").unwrap();

        let journal = open(&dir);

        let history = journal.notification_history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].message.contains("notifications.csv"));
    }

    #[test]
    fn test_handled_save_lands_in_log_and_feed() {
        let dir = TempDir::new().unwrap();
        let journal = open(&dir);
        let state = UiState {
            meal_input: "Toast".to_string(),
            quantity: 2.0,
            ..UiState::default()
        };

        let outcome = handle(&state, &journal.catalog_entries().unwrap(), Command::SaveMeal, now());
        journal.apply(&outcome.effects).unwrap();

        let logs = journal.log_entries().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].name, "Toast");
        assert_eq!(logs[0].category, MealCategory::Breakfast);

        let feed = journal.notifications.latest(5).unwrap();
        assert_eq!(feed[0].message, "Meal saved: Toast (2 servings)");
    }

    #[test]
    fn test_stale_delete_recorded_as_error() {
        let dir = TempDir::new().unwrap();
        let journal = open(&dir);
        journal.catalog.add("Apple", MealCategory::Snack1).unwrap();
        let snapshot = journal.catalog_entries().unwrap();

        let outcome = handle(&UiState::default(), &snapshot, Command::DeleteMeal("Apple".to_string()), now());
        // someone else removed it first
        journal.catalog.delete("Apple").unwrap();
        journal.apply(&outcome.effects).unwrap();

        let history = journal.notification_history().unwrap();
        assert!(history
            .iter()
            .any(|n| n.kind == NotificationKind::Error && n.message == "Failed to delete meal 'Apple'"));
    }

    #[test]
    fn test_now_has_whole_seconds() {
        assert_eq!(now().nanosecond(), 0);
    }
}
