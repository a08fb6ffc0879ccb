use crate::constants::{BROWSER_USER_AGENT, KINO_FEED_URL};
use crate::error::{Result, ShowingsError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub http: HttpConfig,
    pub enrichment: EnrichmentConfig,
    pub tmdb: TmdbConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: KINO_FEED_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub requests_per_min: Option<u64>,
    pub max_in_flight: Option<u32>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            requests_per_min: Some(240),
            max_in_flight: Some(8),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub concurrency: usize,
    pub task_timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            task_timeout_secs: 30,
        }
    }
}

impl EnrichmentConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
}

// Keep the credential out of logs.
impl std::fmt::Debug for TmdbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Load from `path`, or from `config.toml` when it exists, then apply
    /// environment overrides. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ShowingsError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(url) = non_empty_env("KINO_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(key) = non_empty_env("TMDB_API_KEY") {
            self.tmdb.api_key = Some(key);
        }
        if let Some(raw) = non_empty_env("KINO_ENRICH_CONCURRENCY") {
            self.enrichment.concurrency = raw.parse().map_err(|_| {
                ShowingsError::Config(format!("KINO_ENRICH_CONCURRENCY is not a number: {}", raw))
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.enrichment.concurrency == 0 {
            return Err(ShowingsError::Config(
                "enrichment.concurrency must be at least 1".to_string(),
            ));
        }
        if self.feed.url.trim().is_empty() {
            return Err(ShowingsError::Config("feed.url is empty".to_string()));
        }
        Ok(())
    }

    /// The image-metadata credential, when one is configured.
    pub fn tmdb_credential(&self) -> Option<&str> {
        self.tmdb
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
