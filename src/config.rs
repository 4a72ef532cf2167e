use crate::constants;
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub browser: BrowserConfig,
    /// Extra festival fragment -> city entries, appended after the built-in table
    pub festivals: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub base_url: String,
    pub max_pages: u32,
    pub stagnation_threshold: u32,
    pub page_wait_timeout_ms: u64,
    pub page_settle_ms: u64,
    pub scroll_settle_ms: u64,
    pub navigation_settle_ms: u64,
    pub initial_load_settle_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            max_pages: constants::MAX_PAGES,
            stagnation_threshold: constants::STAGNATION_THRESHOLD,
            page_wait_timeout_ms: constants::PAGE_WAIT_TIMEOUT_MS,
            page_settle_ms: constants::PAGE_SETTLE_MS,
            scroll_settle_ms: constants::SCROLL_SETTLE_MS,
            navigation_settle_ms: constants::NAVIGATION_SETTLE_MS,
            initial_load_settle_ms: constants::INITIAL_LOAD_SETTLE_MS,
        }
    }
}

impl CrawlConfig {
    /// Zero-delay settings, for driving the crawl against scripted sessions.
    pub fn without_delays() -> Self {
        Self {
            page_wait_timeout_ms: 0,
            page_settle_ms: 0,
            scroll_settle_ms: 0,
            navigation_settle_ms: 0,
            initial_load_settle_ms: 0,
            ..Self::default()
        }
    }

    pub fn page_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.page_wait_timeout_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn initial_load_settle(&self) -> Duration {
        Duration::from_millis(self.initial_load_settle_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Explicit Chrome/Chromium executable; falls back to auto-detection
    pub chrome_path: Option<String>,
    pub extra_args: Vec<String>,
}

impl Config {
    /// Load `config.toml` from the working directory, or defaults if it is absent.
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        let mut config = if path.exists() {
            Self::from_path(path)?
        } else {
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// `CHROME_BIN` and `SETLIST_BASE_URL` take precedence over the file.
    pub fn apply_env(&mut self) {
        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            if !chrome_bin.trim().is_empty() {
                self.browser.chrome_path = Some(chrome_bin);
            }
        }
        if let Ok(base_url) = std::env::var("SETLIST_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.crawl.base_url = base_url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.crawl.max_pages == 0 {
            return Err(ScraperError::Config("crawl.max_pages must be at least 1".into()));
        }
        if self.crawl.stagnation_threshold == 0 {
            return Err(ScraperError::Config(
                "crawl.stagnation_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
