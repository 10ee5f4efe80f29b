//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/motorlot.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [search]            # optional, every key defaulted
//! suggestion_limit = 10
//! history_limit = 50
//! popular_limit = 10
//! query_timeout_secs = 10
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Maximum strings returned by the suggestions endpoint.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    /// Entries shown on the history page.
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
    /// Popular queries shown on the history page.
    #[serde(default = "default_popular_limit")]
    pub popular_limit: i64,
    /// Upper bound on each store call made while serving a request.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: default_suggestion_limit(),
            history_limit: default_history_limit(),
            popular_limit: default_popular_limit(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

impl SearchConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

fn default_suggestion_limit() -> usize {
    10
}
fn default_history_limit() -> i64 {
    50
}
fn default_popular_limit() -> i64 {
    10
}
fn default_query_timeout_secs() -> u64 {
    10
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    if config.search.suggestion_limit == 0 {
        anyhow::bail!("search.suggestion_limit must be > 0");
    }
    if config.search.history_limit < 1 {
        anyhow::bail!("search.history_limit must be >= 1");
    }
    if config.search.popular_limit < 1 {
        anyhow::bail!("search.popular_limit must be >= 1");
    }
    if config.search.query_timeout_secs == 0 {
        anyhow::bail!("search.query_timeout_secs must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Result<Config> {
        let text = format!(
            "[db]\npath = \"/tmp/lot.sqlite\"\n\n[server]\nbind = \"127.0.0.1:0\"\n{}",
            extra
        );
        let config: Config = toml::from_str(&text)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_search_section_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.search.suggestion_limit, 10);
        assert_eq!(config.search.history_limit, 50);
        assert_eq!(config.search.popular_limit, 10);
        assert_eq!(config.search.query_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_search_section() {
        let config = parse("[search]\nhistory_limit = 5\n").unwrap();
        assert_eq!(config.search.history_limit, 5);
        assert_eq!(config.search.suggestion_limit, 10);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = parse("[search]\nquery_timeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("query_timeout_secs"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/lot.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
