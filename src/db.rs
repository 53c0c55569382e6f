// 🗄️ Tabular file layer - CSV tables read and written wholesale
//
// Every table is a CSV file with a fixed header row. Column order and names
// are the on-disk contract. Saves replace the whole file (write temp + rename).

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::category::MealCategory;
use crate::error::{MealError, Result};

/// Timestamp format used in every table
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// RECORDS
// ============================================================================

/// A row type bound to a fixed column layout
pub trait Record: Serialize + DeserializeOwned {
    const HEADERS: &'static [&'static str];
}

/// Catalog row: a known meal and its slot. `name` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "Meal")]
    pub name: String,

    #[serde(rename = "Category")]
    pub category: MealCategory,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, category: MealCategory) -> Self {
        CatalogEntry {
            name: name.into(),
            category,
        }
    }
}

impl Record for CatalogEntry {
    const HEADERS: &'static [&'static str] = &["Meal", "Category"];
}

/// Log row: one consumed meal. `name` need not exist in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "Date", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,

    #[serde(rename = "Category")]
    pub category: MealCategory,

    #[serde(rename = "Meal")]
    pub name: String,

    /// Servings, always > 0
    #[serde(rename = "Quantity")]
    pub quantity: f64,
}

impl Record for LogEntry {
    const HEADERS: &'static [&'static str] = &["Date", "Category", "Meal", "Quantity"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    Info,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = std::convert::Infallible;

    /// Anything unrecognised is shown as info
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "success" => NotificationKind::Success,
            "warning" => NotificationKind::Warning,
            "error" => NotificationKind::Error,
            _ => NotificationKind::Info,
        })
    }
}

impl Serialize for NotificationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(NotificationKind::Info))
    }
}

/// Audit trail row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,

    #[serde(rename = "Type")]
    pub kind: NotificationKind,

    #[serde(rename = "Message")]
    pub message: String,
}

impl Record for NotificationEntry {
    const HEADERS: &'static [&'static str] = &["Timestamp", "Type", "Message"];
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// CSV TABLE
// ============================================================================

/// Result of loading a table with recovery enabled
#[derive(Debug)]
pub struct Loaded<R> {
    pub rows: Vec<R>,

    /// Set when the file was unreadable and got reinitialized
    pub recovered: Option<MealError>,
}

/// One CSV file holding rows of `R`
#[derive(Debug, Clone)]
pub struct CsvTable<R> {
    path: PathBuf,
    _record: PhantomData<R>,
}

impl<R: Record> CsvTable<R> {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CsvTable {
            path: path.as_ref().to_path_buf(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Parse every row. A missing file is an empty table.
    pub fn read(&self) -> Result<Vec<R>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| self.read_error(e))?;

        let headers = reader.headers().map_err(|e| self.read_error(e))?.clone();

        // Zero-byte file: nothing was ever written
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        if !headers.iter().eq(R::HEADERS.iter().copied()) {
            return Err(self.read_error(format!(
                "unexpected columns [{}], expected [{}]",
                headers.iter().collect::<Vec<_>>().join(", "),
                R::HEADERS.join(", ")
            )));
        }

        let mut rows = Vec::new();
        for (line_num, result) in reader.deserialize().enumerate() {
            // +2 because: 1-indexed + header row
            let row: R = result
                .map_err(|e| self.read_error(format!("line {}: {}", line_num + 2, e)))?;
            rows.push(row);
        }

        Ok(rows)
    }

    /// Read the table, reinitializing it when missing or unreadable.
    ///
    /// An unreadable file is copied to `<name>.corrupt` before being reset.
    /// Earlier backups are kept; later ones become `<name>.corrupt.1`, `.2`, ...
    pub fn load(&self) -> Result<Loaded<R>> {
        if !self.path.exists() {
            debug!("Creating empty table {}", self.path.display());
            self.save(&[])?;
            return Ok(Loaded {
                rows: Vec::new(),
                recovered: None,
            });
        }

        match self.read() {
            Ok(rows) => Ok(Loaded {
                rows,
                recovered: None,
            }),
            Err(err @ MealError::StorageRead { .. }) => {
                warn!("{}; reinitializing empty table", err);

                let backup = self.backup_path();
                if let Err(e) = fs::copy(&self.path, &backup) {
                    warn!("Could not back up {}: {}", self.path.display(), e);
                }

                self.save(&[])?;
                Ok(Loaded {
                    rows: Vec::new(),
                    recovered: Some(err),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Replace the whole file with `rows` (header always written)
    pub fn save(&self, rows: &[R]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
            }
        }

        let tmp_path = self.sibling_path("tmp");

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp_path)
            .map_err(|e| self.write_error(e))?;

        writer
            .write_record(R::HEADERS)
            .map_err(|e| self.write_error(e))?;

        for row in rows {
            writer.serialize(row).map_err(|e| self.write_error(e))?;
        }

        writer.flush().map_err(|e| self.write_error(e))?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.write_error(e))?;
        debug!("Saved {} rows to {}", rows.len(), self.path.display());

        Ok(())
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// First `.corrupt` name not taken by an earlier backup
    fn backup_path(&self) -> PathBuf {
        let first = self.sibling_path("corrupt");
        if !first.exists() {
            return first;
        }
        (1..)
            .map(|n| self.sibling_path(&format!("corrupt.{}", n)))
            .find(|p| !p.exists())
            .unwrap_or(first)
    }

    fn read_error(&self, reason: impl fmt::Display) -> MealError {
        MealError::StorageRead {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn write_error(&self, reason: impl fmt::Display) -> MealError {
        MealError::StorageWrite {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Parse a timestamp in the table format
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let table: CsvTable<CatalogEntry> = CsvTable::new(dir.path().join("catalog.csv"));

        assert!(table.read().unwrap().is_empty());
        assert!(!table.exists());
    }

    #[test]
    fn test_load_creates_file_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("log.csv");
        let table: CsvTable<LogEntry> = CsvTable::new(&path);

        let loaded = table.load().unwrap();
        assert!(loaded.rows.is_empty());
        assert!(loaded.recovered.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), "Date,Category,Meal,Quantity\n");
    }

    #[test]
    fn test_save_then_load_preserves_rows() {
        let dir = TempDir::new().unwrap();
        let table: CsvTable<LogEntry> = CsvTable::new(dir.path().join("log.csv"));

        let rows = vec![
            LogEntry {
                timestamp: ts("2024-03-01 08:15:00"),
                category: MealCategory::Breakfast,
                name: "Oatmeal, with \"raisins\"".to_string(),
                quantity: 1.5,
            },
            LogEntry {
                timestamp: ts("2024-03-01 12:30:45"),
                category: MealCategory::Snack2,
                name: "Apple".to_string(),
                quantity: 2.0,
            },
        ];

        table.save(&rows).unwrap();
        assert_eq!(table.load().unwrap().rows, rows);
    }

    #[test]
    fn test_save_of_load_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notifications.csv");
        let table: CsvTable<NotificationEntry> = CsvTable::new(&path);

        table
            .save(&[
                NotificationEntry {
                    timestamp: ts("2024-03-01 08:15:00"),
                    kind: NotificationKind::Success,
                    message: "Meal saved: Toast (1 servings)".to_string(),
                },
                NotificationEntry {
                    timestamp: ts("2024-03-01 08:16:00"),
                    kind: NotificationKind::Error,
                    message: "Failed, with a comma".to_string(),
                },
            ])
            .unwrap();
        let before = fs::read(&path).unwrap();

        let rows = table.load().unwrap().rows;
        table.save(&rows).unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_corrupt_file_is_backed_up_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(&path, "Meal,Category\nApple,Brunch\n").unwrap();

        let table: CsvTable<CatalogEntry> = CsvTable::new(&path);
        let loaded = table.load().unwrap();

        assert!(loaded.rows.is_empty());
        assert!(matches!(loaded.recovered, Some(MealError::StorageRead { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Meal,Category\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("catalog.csv.corrupt")).unwrap(),
            "Meal,Category\nApple,Brunch\n"
        );
    }

    #[test]
    fn test_repeated_corruption_keeps_earlier_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.csv");
        let table: CsvTable<CatalogEntry> = CsvTable::new(&path);

        fs::write(&path, "first garbage\n").unwrap();
        table.load().unwrap();
        fs::write(&path, "second garbage\n").unwrap();
        table.load().unwrap();
        fs::write(&path, "third garbage\n").unwrap();
        table.load().unwrap();

        let backup = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(backup("catalog.csv.corrupt"), "first garbage\n");
        assert_eq!(backup("catalog.csv.corrupt.1"), "second garbage\n");
        assert_eq!(backup("catalog.csv.corrupt.2"), "third garbage\n");
    }

    #[test]
    fn test_wrong_columns_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(&path, "Category,Meal\nLunch,Soup\n").unwrap();

        let table: CsvTable<CatalogEntry> = CsvTable::new(&path);
        assert!(matches!(table.read(), Err(MealError::StorageRead { .. })));
    }

    #[test]
    fn test_zero_byte_file_is_empty_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(&path, "").unwrap();

        let table: CsvTable<CatalogEntry> = CsvTable::new(&path);
        let loaded = table.load().unwrap();
        assert!(loaded.rows.is_empty());
        assert!(loaded.recovered.is_none());
    }

    #[test]
    fn test_unknown_notification_type_reads_as_info() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notifications.csv");
        fs::write(&path, "Timestamp,Type,Message\n2024-01-01 00:00:00,notice,hello\n").unwrap();

        let table: CsvTable<NotificationEntry> = CsvTable::new(&path);
        let rows = table.read().unwrap();
        assert_eq!(rows[0].kind, NotificationKind::Info);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let table: CsvTable<CatalogEntry> = CsvTable::new(dir.path().join("catalog.csv"));
        table
            .save(&[CatalogEntry::new("Apple", MealCategory::Snack1)])
            .unwrap();

        assert!(!dir.path().join("catalog.csv.tmp").exists());
    }
}
