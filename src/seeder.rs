// 🌱 Catalog Seeder - First-run catalog population from a food search API
//
// Fallback ladder:
// 1. API names per category (up to 10, 2 per search term)
// 2. Category got nothing → 5 placeholder names
// 3. API produced nothing at all → fixed 8-item default catalog

use reqwest::StatusCode;
use serde::Deserialize;
use std::cell::Cell;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::category::MealCategory;
use crate::config::Config;
use crate::db::{CatalogEntry, NotificationKind};
use crate::error::{MealError, Result};
use crate::journal::Journal;

// ============================================================================
// FOOD SEARCH CLIENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeedError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("API key rejected (HTTP {status})")]
    Auth { status: u16 },

    #[error("API request failed with status code: {0}")]
    HttpStatus(u16),

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

/// Anything that can turn a search term into food names
pub trait FoodSearch {
    fn search(&self, query: &str) -> std::result::Result<Vec<String>, SeedError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FoodItem>,
}

#[derive(Debug, Deserialize)]
struct FoodItem {
    #[serde(default)]
    description: String,
}

/// USDA FoodData Central `foods/search` client
pub struct UsdaFoodSearch {
    api_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl UsdaFoodSearch {
    /// Results requested per search term
    pub const PAGE_SIZE: u32 = 5;

    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

impl FoodSearch for UsdaFoodSearch {
    fn search(&self, query: &str) -> std::result::Result<Vec<String>, SeedError> {
        let page_size = Self::PAGE_SIZE.to_string();

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("pageSize", page_size.as_str()),
                ("sortBy", "dataType.keyword"),
                ("sortOrder", "asc"),
            ])
            .send()
            .map_err(|e| SeedError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(SeedError::Auth {
                status: status.as_u16(),
            });
        }
        if status != StatusCode::OK {
            return Err(SeedError::HttpStatus(status.as_u16()));
        }

        let text = response
            .text()
            .map_err(|e| SeedError::Transport(e.to_string()))?;
        parse_food_names(&text)
    }
}

/// Food descriptions from a `foods/search` response body
fn parse_food_names(body: &str) -> std::result::Result<Vec<String>, SeedError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| SeedError::InvalidResponse(e.to_string()))?;
    Ok(parsed.foods.into_iter().map(|f| f.description).collect())
}

// ============================================================================
// SEEDER
// ============================================================================

#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Cap on names collected per category (default: 10)
    pub max_per_category: usize,

    /// Names taken from each search result (default: 2)
    pub per_query: usize,

    /// Placeholder names for a category the API gave nothing for (default: 5)
    pub placeholders: usize,

    /// Extra attempts after a transport failure (default: 2)
    pub max_retries: u32,

    /// Pause between successive requests (default: 300ms)
    pub request_delay: Duration,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            max_per_category: 10,
            per_query: 2,
            placeholders: 5,
            max_retries: 2,
            request_delay: Duration::from_millis(300),
        }
    }
}

impl SeedOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            request_delay: config.request_delay,
            ..Self::default()
        }
    }
}

/// What a seeding run produced. Nothing is written yet.
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub entries: Vec<CatalogEntry>,
    pub notifications: Vec<(NotificationKind, String)>,

    /// Names that came from the API
    pub fetched: usize,

    pub auth_failed: bool,
    pub used_defaults: bool,

    /// Most recent search failure, if any
    pub last_error: Option<MealError>,
}

pub struct CatalogSeeder<'a> {
    search: &'a dyn FoodSearch,
    options: SeedOptions,
    requests_sent: Cell<usize>,
}

impl<'a> CatalogSeeder<'a> {
    pub fn new(search: &'a dyn FoodSearch, options: SeedOptions) -> Self {
        Self {
            search,
            options,
            requests_sent: Cell::new(0),
        }
    }

    /// Collect catalog entries for each category in order
    pub fn seed(&self, categories: &[MealCategory]) -> SeedReport {
        let mut report = SeedReport::default();

        for &category in categories {
            let names = if report.auth_failed {
                Vec::new()
            } else {
                self.fetch_category(category, &mut report)
            };

            if names.is_empty() {
                info!("No API data for {}, adding placeholders", category);
                let label = category.as_str().to_lowercase();
                report.entries.extend(
                    (1..=self.options.placeholders)
                        .map(|i| CatalogEntry::new(format!("Sample {} item {}", label, i), category)),
                );
                report.notifications.push((
                    NotificationKind::Warning,
                    format!("Added placeholder items for {} (API unavailable)", category),
                ));
            } else {
                info!("Fetched {} items for {}", names.len(), category);
                report.fetched += names.len();
                report.notifications.push((
                    NotificationKind::Success,
                    format!("Successfully fetched {} items for {}", names.len(), category),
                ));
                report
                    .entries
                    .extend(names.into_iter().map(|n| CatalogEntry::new(n, category)));
            }
        }

        if report.fetched == 0 {
            info!("No data from API, using the default catalog");
            report.entries = default_catalog();
            report.used_defaults = true;

            // Placeholders were discarded; keep only the auth errors
            report
                .notifications
                .retain(|(kind, _)| *kind == NotificationKind::Error);
            let message = match &report.last_error {
                Some(err) => format!("Created basic meal database (API unavailable: {})", err),
                None => "Created basic meal database (API unavailable)".to_string(),
            };
            report.notifications.push((NotificationKind::Warning, message));
        }

        report
    }

    fn fetch_category(&self, category: MealCategory, report: &mut SeedReport) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();

        for term in category.search_terms() {
            if names.len() >= self.options.max_per_category {
                break;
            }

            debug!("Fetching data for {} with query: {}", category, term);
            match self.search_with_retry(term) {
                Ok(foods) => {
                    if foods.is_empty() {
                        debug!("No foods found for {}", term);
                    }
                    for food in foods.iter().take(self.options.per_query) {
                        if names.len() >= self.options.max_per_category {
                            break;
                        }
                        let name = food.trim();
                        if !name.is_empty() && !names.iter().any(|n| n == name) {
                            names.push(name.to_string());
                        }
                    }
                }
                Err(SeedError::Auth { status }) => {
                    warn!("API key issue (HTTP {}), skipping remaining searches", status);
                    report.auth_failed = true;
                    report.last_error = Some(SeedError::Auth { status }.into());
                    report.notifications.push((
                        NotificationKind::Error,
                        format!("API authentication failed for {}", category),
                    ));
                    break;
                }
                Err(e) => {
                    warn!("Search '{}' for {} failed: {}", term, category, e);
                    report.last_error = Some(e.into());
                }
            }
        }

        names
    }

    /// Transport failures are retried; everything else is returned as is
    fn search_with_retry(&self, term: &str) -> std::result::Result<Vec<String>, SeedError> {
        let mut attempt = 0;
        loop {
            self.pause();
            match self.search.search(term) {
                Err(SeedError::Transport(msg)) if attempt < self.options.max_retries => {
                    attempt += 1;
                    warn!("Request for '{}' failed ({}), retry {}", term, msg, attempt);
                }
                other => return other,
            }
        }
    }

    /// Inter-request pause, skipped before the first request
    fn pause(&self) {
        let sent = self.requests_sent.get();
        if sent > 0 && !self.options.request_delay.is_zero() {
            thread::sleep(self.options.request_delay);
        }
        self.requests_sent.set(sent + 1);
    }
}

/// Catalog installed when the API gave no names at all
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("Oatmeal", MealCategory::Breakfast),
        CatalogEntry::new("Scrambled Eggs", MealCategory::Breakfast),
        CatalogEntry::new("Turkey Sandwich", MealCategory::Lunch),
        CatalogEntry::new("Green Salad", MealCategory::Lunch),
        CatalogEntry::new("Grilled Chicken", MealCategory::Dinner),
        CatalogEntry::new("Steamed Vegetables", MealCategory::Dinner),
        CatalogEntry::new("Apple", MealCategory::Snack1),
        CatalogEntry::new("Greek Yogurt", MealCategory::Snack2),
    ]
}

// ============================================================================
// STARTUP FLOW
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    /// Catalog already had rows; nothing fetched
    AlreadySeeded(usize),

    Seeded { items: usize, from_api: usize, used_defaults: bool },
}

/// Seed the catalog if it is empty, recording every outcome as a notification
pub fn ensure_seeded(
    journal: &Journal,
    search: &dyn FoodSearch,
    options: SeedOptions,
) -> Result<SeedOutcome> {
    let existing = journal.catalog_entries()?;
    if !existing.is_empty() {
        journal.notify(
            NotificationKind::Info,
            &format!("Database already exists with {} items.", existing.len()),
        )?;
        return Ok(SeedOutcome::AlreadySeeded(existing.len()));
    }

    info!("Initializing catalog from food search API");
    let report = CatalogSeeder::new(search, options).seed(&MealCategory::ALL);
    let items = journal.catalog.replace_all(report.entries)?;

    for (kind, message) in &report.notifications {
        journal.notify(*kind, message)?;
    }

    let summary = if report.used_defaults {
        format!("Database initialized with {} default items", items)
    } else {
        format!("Database initialized with {} items from the food search API!", items)
    };
    journal.notify(NotificationKind::Success, &summary)?;

    Ok(SeedOutcome::Seeded {
        items,
        from_api: report.fetched,
        used_defaults: report.used_defaults,
    })
}

/// Drop the current catalog and seed it again
pub fn reseed(journal: &Journal, search: &dyn FoodSearch, options: SeedOptions) -> Result<SeedOutcome> {
    journal.catalog.save(&[])?;
    journal.notify(NotificationKind::Info, "Attempting to reinitialize database...")?;
    ensure_seeded(journal, search, options)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_parse_food_names() {
        let body = r#"{
            "totalHits": 2,
            "foods": [
                {"fdcId": 1, "description": "Oatmeal, cooked", "dataType": "Survey (FNDDS)"},
                {"fdcId": 2, "description": "Oat bran muffin"}
            ]
        }"#;

        assert_eq!(
            parse_food_names(body).unwrap(),
            vec!["Oatmeal, cooked", "Oat bran muffin"]
        );
        assert_eq!(parse_food_names("{}").unwrap(), Vec::<String>::new());
        assert!(matches!(
            parse_food_names("<html>rate limited</html>"),
            Err(SeedError::InvalidResponse(_))
        ));
    }

    /// Replays canned answers per search term and records every call
    struct ScriptedSearch {
        answers: HashMap<String, std::result::Result<Vec<String>, SeedError>>,
        fallback: std::result::Result<Vec<String>, SeedError>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedSearch {
        fn always(result: std::result::Result<Vec<String>, SeedError>) -> Self {
            Self {
                answers: HashMap::new(),
                fallback: result,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn answer(mut self, term: &str, result: std::result::Result<Vec<&str>, SeedError>) -> Self {
            self.answers.insert(
                term.to_string(),
                result.map(|names| names.into_iter().map(String::from).collect()),
            );
            self
        }

        fn call_count(&self, term: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == term).count()
        }
    }

    impl FoodSearch for ScriptedSearch {
        fn search(&self, query: &str) -> std::result::Result<Vec<String>, SeedError> {
            self.calls.borrow_mut().push(query.to_string());
            self.answers
                .get(query)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    /// Fails with a transport error a fixed number of times, then answers
    struct FlakySearch {
        failures_left: Cell<u32>,
        calls: Cell<u32>,
    }

    impl FoodSearch for FlakySearch {
        fn search(&self, query: &str) -> std::result::Result<Vec<String>, SeedError> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(SeedError::Transport("connection reset".to_string()));
            }
            Ok(vec![format!("{} food", query)])
        }
    }

    fn options() -> SeedOptions {
        SeedOptions {
            request_delay: Duration::ZERO,
            ..SeedOptions::default()
        }
    }

    fn journal(dir: &TempDir) -> Journal {
        Journal::open(&Config::with_data_dir(dir.path())).unwrap()
    }

    #[test]
    fn test_takes_two_names_per_term_up_to_ten() {
        let search = ScriptedSearch::always(Ok(Vec::new()))
            .answer("oatmeal", Ok(vec!["Oats, raw", "Oatmeal, cooked", "Oat bran"]))
            .answer("eggs", Ok(vec!["Egg, whole", "Egg, white"]))
            .answer("toast", Ok(vec!["Toast, white", "Toast, wheat"]))
            .answer("cereal", Ok(vec!["Cereal A", "Cereal B"]))
            .answer("pancakes", Ok(vec!["Pancake, plain", "Pancake, buttermilk"]));

        let report = CatalogSeeder::new(&search, options()).seed(&[MealCategory::Breakfast]);

        assert_eq!(report.fetched, 10);
        assert_eq!(report.entries.len(), 10);
        assert!(!report.entries.iter().any(|e| e.name == "Oat bran"));
        assert!(report
            .notifications
            .contains(&(NotificationKind::Success, "Successfully fetched 10 items for Breakfast".to_string())));
    }

    #[test]
    fn test_duplicates_within_category_skipped() {
        let search = ScriptedSearch::always(Ok(vec!["Chicken breast".to_string()]))
            .answer("chicken", Ok(vec!["Chicken breast", "  Chicken thigh  "]));

        let report = CatalogSeeder::new(&search, options()).seed(&[MealCategory::Dinner]);

        let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Chicken breast", "Chicken thigh"]);
    }

    #[test]
    fn test_failed_category_gets_placeholders() {
        let search = ScriptedSearch::always(Err(SeedError::HttpStatus(500)))
            .answer("sandwich", Ok(vec!["Club sandwich"]));

        let report = CatalogSeeder::new(&search, options())
            .seed(&[MealCategory::Lunch, MealCategory::Dinner]);

        let dinner: Vec<&str> = report
            .entries
            .iter()
            .filter(|e| e.category == MealCategory::Dinner)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(dinner.len(), 5);
        assert_eq!(dinner[0], "Sample dinner item 1");
        assert_eq!(dinner[4], "Sample dinner item 5");
        assert!(!report.used_defaults);
        assert!(report.notifications.contains(&(
            NotificationKind::Warning,
            "Added placeholder items for Dinner (API unavailable)".to_string()
        )));
    }

    #[test]
    fn test_nothing_fetched_installs_default_catalog() {
        let search = ScriptedSearch::always(Err(SeedError::Transport("offline".to_string())));

        let report = CatalogSeeder::new(&search, options()).seed(&MealCategory::ALL);

        assert!(report.used_defaults);
        assert_eq!(report.entries, default_catalog());
        assert!(matches!(report.last_error, Some(MealError::Transport(_))));

        // only the default catalog notice, no stale placeholder notices
        assert_eq!(
            report.notifications,
            vec![(
                NotificationKind::Warning,
                "Created basic meal database (API unavailable: Transport error: offline)".to_string()
            )]
        );
    }

    #[test]
    fn test_auth_failure_stops_all_searches() {
        let search = ScriptedSearch::always(Err(SeedError::Auth { status: 403 }));

        let report = CatalogSeeder::new(&search, options()).seed(&MealCategory::ALL);

        assert_eq!(search.calls.borrow().len(), 1);
        assert!(report.auth_failed);
        assert!(matches!(report.last_error, Some(MealError::Auth { status: 403 })));
        assert_eq!(report.entries, default_catalog());
        assert!(!report
            .notifications
            .iter()
            .any(|(_, msg)| msg.starts_with("Added placeholder items")));
        let auth_errors = report
            .notifications
            .iter()
            .filter(|(kind, msg)| *kind == NotificationKind::Error && msg.contains("authentication"))
            .count();
        assert_eq!(auth_errors, 1);
    }

    #[test]
    fn test_auth_failure_after_success_keeps_fetched_names() {
        let search = ScriptedSearch::always(Err(SeedError::Auth { status: 401 }))
            .answer("oatmeal", Ok(vec!["Oats"]));

        let report = CatalogSeeder::new(&search, options())
            .seed(&[MealCategory::Breakfast, MealCategory::Lunch]);

        assert!(!report.used_defaults);
        assert_eq!(report.entries[0].name, "Oats");
        assert_eq!(report.entries[1].name, "Sample lunch item 1");
        assert_eq!(search.call_count("sandwich"), 0);
    }

    #[test]
    fn test_transport_errors_retried_per_term() {
        let search = FlakySearch {
            failures_left: Cell::new(2),
            calls: Cell::new(0),
        };
        let opts = SeedOptions {
            max_per_category: 1,
            ..options()
        };

        let report = CatalogSeeder::new(&search, opts).seed(&[MealCategory::Breakfast]);

        assert_eq!(search.calls.get(), 3);
        assert_eq!(report.entries[0].name, "oatmeal food");
    }

    #[test]
    fn test_retries_exhausted_moves_to_next_term() {
        let search = FlakySearch {
            failures_left: Cell::new(3),
            calls: Cell::new(0),
        };
        let opts = SeedOptions {
            max_per_category: 1,
            ..options()
        };

        let report = CatalogSeeder::new(&search, opts).seed(&[MealCategory::Breakfast]);

        // 3 failed attempts on "oatmeal", then "eggs" succeeds
        assert_eq!(search.calls.get(), 4);
        assert_eq!(report.entries[0].name, "eggs food");
    }

    #[test]
    fn test_ensure_seeded_with_auth_failure_everywhere() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir);
        let search = ScriptedSearch::always(Err(SeedError::Auth { status: 403 }));

        let outcome = ensure_seeded(&journal, &search, options()).unwrap();

        assert_eq!(
            outcome,
            SeedOutcome::Seeded {
                items: 8,
                from_api: 0,
                used_defaults: true
            }
        );
        assert_eq!(journal.catalog_entries().unwrap(), default_catalog());

        let notes = journal.notifications.entries().unwrap();
        assert!(notes
            .iter()
            .any(|n| n.kind == NotificationKind::Error && n.message.contains("authentication")));
    }

    #[test]
    fn test_ensure_seeded_skips_existing_catalog() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir);
        journal.catalog.add("Toast", MealCategory::Breakfast).unwrap();
        let search = ScriptedSearch::always(Ok(vec!["Should not be used".to_string()]));

        let outcome = ensure_seeded(&journal, &search, options()).unwrap();

        assert_eq!(outcome, SeedOutcome::AlreadySeeded(1));
        assert!(search.calls.borrow().is_empty());
        let latest = journal.notifications.latest(1).unwrap();
        assert_eq!(latest[0].message, "Database already exists with 1 items.");
    }

    #[test]
    fn test_reseed_replaces_catalog() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir);
        journal.catalog.add("Toast", MealCategory::Breakfast).unwrap();
        let search = ScriptedSearch::always(Err(SeedError::HttpStatus(503)));

        reseed(&journal, &search, options()).unwrap();

        assert!(!journal.catalog.contains("Toast").unwrap());
        assert_eq!(journal.catalog.entries().unwrap().len(), 8);
    }
}
