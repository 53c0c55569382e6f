// 📒 Catalog Store - Known meals keyed by exact name
//
// Whole-table read-modify-write on every mutation. Names are unique.

use std::path::Path;
use tracing::info;

use crate::category::MealCategory;
use crate::db::{CatalogEntry, CsvTable, Loaded};
use crate::error::Result;

pub struct CatalogStore {
    table: CsvTable<CatalogEntry>,
}

impl CatalogStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CatalogStore {
            table: CsvTable::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.table.path()
    }

    pub fn load(&self) -> Result<Loaded<CatalogEntry>> {
        self.table.load()
    }

    pub fn save(&self, entries: &[CatalogEntry]) -> Result<()> {
        self.table.save(entries)
    }

    /// Current rows, reinitializing the file if needed
    pub fn entries(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.load()?.rows)
    }

    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.entries()?.into_iter().map(|e| e.name).collect())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries()?.is_empty())
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.entries()?.iter().any(|e| e.name == name))
    }

    pub fn category_of(&self, name: &str) -> Result<Option<MealCategory>> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.category))
    }

    /// Insert a new meal. Returns false if the name is already present.
    pub fn add(&self, name: &str, category: MealCategory) -> Result<bool> {
        let mut entries = self.entries()?;
        if entries.iter().any(|e| e.name == name) {
            return Ok(false);
        }

        entries.push(CatalogEntry::new(name, category));
        self.save(&entries)?;
        info!("Catalog: added '{}' ({})", name, category);
        Ok(true)
    }

    /// Rename and/or recategorize `old_name`.
    ///
    /// Returns false if `old_name` is absent, or if `new_name` already belongs
    /// to a different entry.
    pub fn update(&self, old_name: &str, new_name: &str, new_category: MealCategory) -> Result<bool> {
        let mut entries = self.entries()?;

        let Some(idx) = entries.iter().position(|e| e.name == old_name) else {
            return Ok(false);
        };

        if new_name != old_name && entries.iter().any(|e| e.name == new_name) {
            return Ok(false);
        }

        entries[idx].name = new_name.to_string();
        entries[idx].category = new_category;
        self.save(&entries)?;
        info!("Catalog: updated '{}' -> '{}' ({})", old_name, new_name, new_category);
        Ok(true)
    }

    /// Remove a meal. Returns false if absent.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|e| e.name != name);

        if entries.len() == before {
            return Ok(false);
        }

        self.save(&entries)?;
        info!("Catalog: deleted '{}'", name);
        Ok(true)
    }

    /// Overwrite the table, keeping only the first row for each name
    pub fn replace_all(&self, entries: Vec<CatalogEntry>) -> Result<usize> {
        let mut unique: Vec<CatalogEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !unique.iter().any(|e| e.name == entry.name) {
                unique.push(entry);
            }
        }

        self.save(&unique)?;
        Ok(unique.len())
    }
}
