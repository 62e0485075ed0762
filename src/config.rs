//! Configuration for the boatrace scraper.

use serde::{Deserialize, Serialize};

/// Collector (network) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Grade schedule pages the crawl starts from
    #[serde(default = "default_seed_urls")]
    pub seed_urls: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause between tournaments, lower bound (inclusive)
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,
    /// Pause between tournaments, upper bound (exclusive)
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_base_url() -> String {
    "https://www.boatrace.jp".to_string()
}

fn default_seed_urls() -> Vec<String> {
    ["01", "02", "03"]
        .iter()
        .map(|hcd| {
            format!(
                "https://www.boatrace.jp/owpc/pc/race/gradesch?year=2024&hcd={}",
                hcd
            )
        })
        .collect()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_min_delay_secs() -> u64 {
    2
}

fn default_max_delay_secs() -> u64 {
    5
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            seed_urls: default_seed_urls(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

/// Local paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the downloaded race folders
    #[serde(default = "default_html_dir")]
    pub html_dir: String,
    #[serde(default = "default_output_csv")]
    pub output_csv: String,
}

fn default_html_dir() -> String {
    "scraping/downloaded_html".to_string()
}

fn default_output_csv() -> String {
    "make_csv/boat-race.csv".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            html_dir: default_html_dir(),
            output_csv: default_output_csv(),
        }
    }
}

/// Network retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(Self::environment())
    }

    /// `BOATRACE_SECTION__KEY` variables; `collector.seed_urls` takes a
    /// comma separated list
    fn environment() -> config::Environment {
        config::Environment::with_prefix("BOATRACE")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("collector.seed_urls")
            .try_parsing(true)
    }

    fn load_with(environment: config::Environment) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (BOATRACE_STORAGE__HTML_DIR, etc.)
            .add_source(environment)
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
