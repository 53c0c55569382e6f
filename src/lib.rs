// Meal Journal - Core Library
// Exposes stores, matcher, seeder and command handlers for the CLI, TUI and tests

pub mod app;
pub mod catalog;
pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod fuzzy;
pub mod journal;
pub mod meal_log;
pub mod notifications;
pub mod seeder;

// Re-export commonly used types
pub use app::{handle, suggestions, Command, Effect, Outcome, UiState};
pub use catalog::CatalogStore;
pub use category::MealCategory;
pub use config::Config;
pub use db::{
    CatalogEntry, CsvTable, LogEntry, NotificationEntry, NotificationKind, Record,
};
pub use error::{MealError, ValidationError};
pub use fuzzy::{find_matches, FuzzyMatcher, MatchResult};
pub use journal::Journal;
pub use meal_log::LogStore;
pub use notifications::NotificationStore;
pub use seeder::{
    default_catalog, ensure_seeded, reseed, CatalogSeeder, FoodSearch, SeedError, SeedOptions,
    SeedOutcome, SeedReport, UsdaFoodSearch,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
