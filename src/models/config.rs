//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote search endpoint settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Result page extraction settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Characters used to build search strings
    #[serde(default)]
    pub alphabet: AlphabetConfig,

    /// Worker pool and pacing settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Static sharding settings
    #[serde(default)]
    pub partition: PartitionConfig,

    /// Export destination
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.search.url.trim().is_empty() {
            return Err(AppError::config("search.url is empty"));
        }
        url::Url::parse(&self.search.url)
            .map_err(|e| AppError::config(format!("search.url is invalid: {e}")))?;
        if self.search.form_field.trim().is_empty() {
            return Err(AppError::config("search.form_field is empty"));
        }
        if self.search.user_agent.trim().is_empty() {
            return Err(AppError::config("search.user_agent is empty"));
        }
        if self.search.timeout_secs == 0 {
            return Err(AppError::config("search.timeout_secs must be > 0"));
        }
        if self.parser.table_selector.trim().is_empty() {
            return Err(AppError::config("parser.table_selector is empty"));
        }
        if self.parser.capacity_marker.trim().is_empty() {
            return Err(AppError::config("parser.capacity_marker is empty"));
        }
        if self.alphabet.sets.iter().all(|set| set.is_empty()) {
            return Err(AppError::config("alphabet.sets contains no characters"));
        }
        if self.scheduler.workers == 0 {
            return Err(AppError::config("scheduler.workers must be > 0"));
        }
        if self.scheduler.retry_attempts == 0 {
            return Err(AppError::config("scheduler.retry_attempts must be > 0"));
        }
        if let Some(bucket) = self.partition.bucket {
            if self.partition.buckets <= 0 {
                return Err(AppError::config(
                    "partition.bucket requires partition.buckets > 0",
                ));
            }
            if bucket >= self.partition.buckets as u64 {
                return Err(AppError::config(format!(
                    "partition.bucket {} is out of range for {} buckets",
                    bucket, self.partition.buckets
                )));
            }
        }
        Ok(())
    }
}

/// Remote search endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search form POST target
    #[serde(default = "defaults::url")]
    pub url: String,

    /// Name of the single form field carrying the search string
    #[serde(default = "defaults::form_field")]
    pub form_field: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Skip TLS certificate validation. The register host serves a broken chain.
    #[serde(default = "defaults::accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            form_field: defaults::form_field(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            accept_invalid_certs: defaults::accept_invalid_certs(),
        }
    }
}

/// Result page extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// CSS selector of the result table body
    #[serde(default = "defaults::table_selector")]
    pub table_selector: String,

    /// Text the server renders instead of results when a query is too broad
    #[serde(default = "defaults::capacity_marker")]
    pub capacity_marker: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            table_selector: defaults::table_selector(),
            capacity_marker: defaults::capacity_marker(),
        }
    }
}

/// Characters used to build search strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphabetConfig {
    /// Ordered character sets concatenated into the alphabet
    #[serde(default = "defaults::alphabet_sets")]
    pub sets: Vec<String>,

    /// Characters inserted between two alphabet characters
    #[serde(default = "defaults::separators")]
    pub separators: String,
}

impl Default for AlphabetConfig {
    fn default() -> Self {
        Self {
            sets: defaults::alphabet_sets(),
            separators: defaults::separators(),
        }
    }
}

/// Worker pool and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of concurrent workers
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Deadline for the whole run in seconds
    #[serde(default)]
    pub deadline_secs: Option<u64>,

    /// Delay each worker waits after a request, in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,

    /// Attempts per variation, including the first one
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: usize,

    /// Delay between attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl SchedulerConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: defaults::workers(),
            deadline_secs: None,
            request_delay_ms: 0,
            retry_attempts: defaults::retry_attempts(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Static sharding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Number of buckets; zero or less disables partitioning
    #[serde(default)]
    pub buckets: i64,

    /// Bucket processed by this run
    #[serde(default)]
    pub bucket: Option<u64>,
}

/// Export destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output file, `.json` selects JSON, anything else a spreadsheet
    #[serde(default = "defaults::output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Search defaults
    pub fn url() -> String {
        "https://lk.rs-class.org/regbook/regbookVessel?ln=ru".into()
    }
    pub fn form_field() -> String {
        "namer".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; regbook/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn accept_invalid_certs() -> bool {
        true
    }

    // Parser defaults
    pub fn table_selector() -> String {
        "tbody#myTable0".into()
    }
    pub fn capacity_marker() -> String {
        "Результат запроса более 1000 записей! Уточните параметры запроса".into()
    }

    // Alphabet defaults
    pub fn alphabet_sets() -> Vec<String> {
        vec![
            "АБВГДЕЁЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯ".into(),
            "ABCDEFGHIJKLMNOPQRSTUVWXYZ".into(),
            "0123456789".into(),
        ]
    }
    pub fn separators() -> String {
        "-".into()
    }

    // Scheduler defaults
    pub fn workers() -> usize {
        20
    }
    pub fn retry_attempts() -> usize {
        1
    }
    pub fn retry_delay() -> u64 {
        1000
    }

    // Output defaults
    pub fn output_path() -> PathBuf {
        PathBuf::from("regbook.xlsx")
    }
}
