use std::time::Duration;

/// Desktop browser identity sent with every page request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Scraper settings
    pub scraper_config: ScraperConfig,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// How long a scraped quote set is reused before refetching
    pub cache_ttl: Duration,

    /// Maximum time to load a page
    pub page_load_timeout: Duration,

    /// Maximum time to wait for a price element to show up
    pub element_timeout: Duration,

    /// Delay between checks while waiting for an element
    pub poll_interval: Duration,

    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            page_load_timeout: Duration::from_secs(60),
            element_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    ///
    /// Unset and empty values both fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Config {
            server_host: var("HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .trim()
                .parse()?,
            scraper_config: ScraperConfig::default(),
        })
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
