use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Which rendering engine loads pages for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// A browser driven over WebDriver (ChromeDriver, geckodriver, ...)
    #[default]
    WebDriver,
    /// Plain HTTP GET with pattern-based extraction, for hosts without a browser
    Static,
}

/// Configuration for a site audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Hard cap on discovered and analyzed pages
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum number of pages analyzed at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Time allowed for a page to load and settle
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Time allowed for a single broken-link probe
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Number of links per page checked for 404s
    #[serde(default = "default_probe_sample_size")]
    pub probe_sample_size: usize,

    /// How long the network must stay quiet before a rendered page counts as settled
    #[serde(default = "default_settle_quiet_ms")]
    pub settle_quiet_ms: u64,

    /// Deadline for the whole run; pages finished before it are still reported
    #[serde(default)]
    pub total_timeout_secs: Option<u64>,

    /// Rendering engine
    #[serde(default)]
    pub renderer: RendererKind,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// User agent sent by the fetcher and the browser
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Regex patterns a crawled URL must match (empty means all)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs the crawl never follows
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Listen address for `serve`
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Default value for max_pages
fn default_max_pages() -> usize {
    500
}

/// Default value for max_concurrency
fn default_max_concurrency() -> usize {
    4
}

fn default_page_timeout_ms() -> u64 {
    30_000
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_probe_sample_size() -> usize {
    10
}

fn default_settle_quiet_ms() -> u64 {
    500
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_user_agent() -> String {
    "SEO-Analyzer-Bot".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_concurrency: default_max_concurrency(),
            page_timeout_ms: default_page_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_sample_size: default_probe_sample_size(),
            settle_quiet_ms: default_settle_quiet_ms(),
            total_timeout_secs: None,
            renderer: RendererKind::default(),
            webdriver_url: default_webdriver_url(),
            user_agent: default_user_agent(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            bind: default_bind(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Override the WebDriver URL with the `WEBDRIVER_URL` environment variable if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn settle_quiet(&self) -> Duration {
        Duration::from_millis(self.settle_quiet_ms)
    }

    pub fn total_timeout(&self) -> Option<Duration> {
        self.total_timeout_secs.map(Duration::from_secs)
    }
}
