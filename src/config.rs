// ⚙️ Configuration - data location and food search API settings

use std::path::{Path, PathBuf};
use std::time::Duration;

/// USDA FoodData Central search endpoint
pub const DEFAULT_API_URL: &str = "https://api.nal.usda.gov/fdc/v1/foods/search";

/// Rate-limited public key accepted by FoodData Central
pub const DEFAULT_API_KEY: &str = "DEMO_KEY";

pub const CATALOG_FILE: &str = "meal_catalog.csv";
pub const LOG_FILE: &str = "meal_log.csv";
pub const NOTIFICATIONS_FILE: &str = "notifications.csv";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the three table files
    pub data_dir: PathBuf,

    pub api_url: String,
    pub api_key: String,

    /// Pause between successive search requests while seeding
    pub request_delay: Duration,

    pub request_timeout: Duration,

    /// Extra attempts per search term after a transport failure
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            api_url: DEFAULT_API_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            request_delay: Duration::from_millis(300),
            request_timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }
}

impl Config {
    /// Default settings with tables stored under `data_dir`
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub fn notifications_path(&self) -> PathBuf {
        self.data_dir.join(NOTIFICATIONS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_paths_live_under_data_dir() {
        let config = Config::with_data_dir("/tmp/meals");

        assert_eq!(config.catalog_path(), PathBuf::from("/tmp/meals/meal_catalog.csv"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/meals/meal_log.csv"));
        assert_eq!(
            config.notifications_path(),
            PathBuf::from("/tmp/meals/notifications.csv")
        );
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
