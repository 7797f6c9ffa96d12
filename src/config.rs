//! Configuration loading for listharvest.
//!
//! Settings come from a config file when one is found, otherwise from
//! built-in defaults. An explicit `--config` path wins; without one, the
//! `prefer` crate discovers a `listharvest` config file in the standard
//! locations (working directory, user config directory).

mod browser;
mod categories;
mod selectors;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use browser::{default_headless, default_timeout, BrowserConfig};
pub use categories::{default_categories, Category};
pub use selectors::ItemSelectors;

/// Name `prefer` discovers config files under.
pub const CONFIG_NAME: &str = "listharvest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid config {path}: {source}")]
    ParseJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
}

/// Tuning for the scan/scroll loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    /// Items to collect per page.
    pub target_count: usize,
    /// Consecutive empty scans before giving up on a page.
    pub stall_threshold: u32,
    /// Pixels scrolled per attempt.
    pub scroll_increment: i64,
    /// Pause after the ready marker appears.
    pub initial_settle_ms: u64,
    /// Pause before every scan.
    pub scan_settle_ms: u64,
    /// Pause after every scroll.
    pub scroll_settle_ms: u64,
    /// How long to wait for the ready marker.
    pub marker_timeout_secs: u64,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            target_count: 1000,
            stall_threshold: 10,
            scroll_increment: 2000,
            initial_settle_ms: 2000,
            scan_settle_ms: 1000,
            scroll_settle_ms: 2500,
            marker_timeout_secs: 10,
        }
    }
}

impl HarvestSettings {
    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn scan_settle(&self) -> Duration {
        Duration::from_millis(self.scan_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn marker_timeout(&self) -> Duration {
        Duration::from_secs(self.marker_timeout_secs)
    }

    /// Same policy with every settle delay removed.
    pub fn without_delays(self) -> Self {
        Self {
            initial_settle_ms: 0,
            scan_settle_ms: 0,
            scroll_settle_ms: 0,
            ..self
        }
    }
}

/// Where harvested catalogs are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory for per-category files and the merged catalog.
    pub dir: PathBuf,
    /// File name of the merged catalog inside `dir`.
    pub merged_file: String,
    /// Attach a 1-based `index` to every item in the merged catalog.
    pub add_indices: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("database"),
            merged_file: "musinsa_products_db.json".to_string(),
            add_indices: true,
        }
    }
}

impl OutputSettings {
    /// Per-category file, e.g. `database/temp_hoodie.json`.
    pub fn category_file(&self, key: &str) -> PathBuf {
        self.dir.join(format!("temp_{}.json", key))
    }

    pub fn merged_path(&self) -> PathBuf {
        self.dir.join(&self.merged_file)
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub harvest: HarvestSettings,
    pub selectors: ItemSelectors,
    pub browser: BrowserConfig,
    pub output: OutputSettings,
    pub categories: Vec<Category>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            harvest: HarvestSettings::default(),
            selectors: ItemSelectors::default(),
            browser: BrowserConfig::default(),
            output: OutputSettings::default(),
            categories: default_categories(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when no file is found.
    ///
    /// An explicit path must exist; discovered paths are optional.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover_config_file().await,
        };

        let settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        Ok(settings.with_env_overrides())
    }

    /// Parse a config file; `.json` files are read as JSON, anything else
    /// as TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {:?}", path);
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).map_err(|source| ConfigError::ParseJson {
                    path: path.to_path_buf(),
                    source,
                })
            }
            _ => Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        self.browser = self.browser.with_env_overrides();
        self
    }

    pub fn category(&self, key: &str) -> Result<&Category, ConfigError> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| ConfigError::UnknownCategory(key.to_string()))
    }

    /// Categories restricted to `only` (all of them when `only` is empty),
    /// in configuration order.
    pub fn select_categories(&self, only: &[String]) -> Result<Vec<Category>, ConfigError> {
        if only.is_empty() {
            return Ok(self.categories.clone());
        }
        for key in only {
            self.category(key)?;
        }
        Ok(self
            .categories
            .iter()
            .filter(|c| only.contains(&c.key))
            .cloned()
            .collect())
    }
}

/// Use prefer for file discovery only; parsing stays with serde.
async fn discover_config_file() -> Option<PathBuf> {
    match prefer::load(CONFIG_NAME).await {
        Ok(found) => found.source_path().map(|path| path.to_path_buf()),
        Err(e) => {
            debug!("No {} config discovered: {}", CONFIG_NAME, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_crawler_constants() {
        let settings = Settings::default();
        assert_eq!(settings.harvest.target_count, 1000);
        assert_eq!(settings.harvest.stall_threshold, 10);
        assert_eq!(settings.harvest.scroll_increment, 2000);
        assert_eq!(settings.harvest.scroll_settle(), Duration::from_millis(2500));
        assert_eq!(settings.categories.len(), 31);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [harvest]
            target_count = 50
            stall_threshold = 4

            [output]
            dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(settings.harvest.target_count, 50);
        assert_eq!(settings.harvest.stall_threshold, 4);
        assert_eq!(settings.harvest.scroll_increment, 2000);
        assert_eq!(settings.output.dir, PathBuf::from("out"));
        assert_eq!(settings.output.merged_file, "musinsa_products_db.json");
        assert_eq!(settings.selectors, ItemSelectors::default());
    }

    #[test]
    fn test_categories_replace_defaults() {
        let settings = Settings::from_toml(
            r#"
            [[categories]]
            key = "hoodie"
            label = "후드"
            url = "https://www.musinsa.com/category/001004"
            "#,
        )
        .unwrap();

        assert_eq!(settings.categories.len(), 1);
        assert_eq!(settings.category("hoodie").unwrap().label, "후드");
        assert!(matches!(
            settings.category("shirt"),
            Err(ConfigError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_select_categories_keeps_config_order() {
        let settings = Settings::default();
        let picked = settings
            .select_categories(&["hoodie".to_string(), "knit_sweater".to_string()])
            .unwrap();
        let keys: Vec<&str> = picked.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["knit_sweater", "hoodie"]);

        assert!(settings.select_categories(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_output_paths() {
        let output = OutputSettings::default();
        assert_eq!(
            output.category_file("hoodie"),
            PathBuf::from("database/temp_hoodie.json")
        );
        assert_eq!(
            output.merged_path(),
            PathBuf::from("database/musinsa_products_db.json")
        );
    }

    #[test]
    fn test_from_file_reports_missing_path() {
        let err = Settings::from_file(Path::new("/nonexistent/listharvest.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_explicit_path_skips_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.toml");
        fs::write(&path, "[harvest]\ntarget_count = 25\n").unwrap();

        let settings = Settings::load(Some(&path)).await.unwrap();
        assert_eq!(settings.harvest.target_count, 25);
        assert_eq!(settings.harvest.stall_threshold, 10);
    }

    #[tokio::test]
    async fn test_load_missing_explicit_path_fails() {
        let err = Settings::load(Some(Path::new("/nonexistent/crawl.toml")))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_from_file_reads_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listharvest.json");
        fs::write(&path, r#"{"harvest": {"scroll_increment": 1500}}"#).unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.harvest.scroll_increment, 1500);
        assert_eq!(settings.harvest.target_count, 1000);

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::ParseJson { .. })
        ));
    }
}
