use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reddit: RedditConfig,
    pub saucenao: SauceNaoConfig,
    pub cache: CacheConfig,
    pub metrics: MetricsConfig,
    pub templates: TemplateConfig,
    pub bot: BotConfig,
}

/// Reddit script-app credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    /// Token endpoint host
    pub auth_url: String,
    /// OAuth API host
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SauceNaoConfig {
    pub api_key: String,
    pub base_url: String,
    /// Number of matches requested per search (`numres`)
    pub results: u32,
    #[serde(with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    Redis,
    Memory,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    /// Upper bound on entries for the memory backend
    pub memory_capacity: usize,
    /// Expiry for records with at least one source
    #[serde(with = "duration_serde::duration")]
    pub found_ttl: Duration,
    /// Expiry for "not found" answers; short so newly indexed images get picked up
    #[serde(with = "duration_serde::duration")]
    pub not_found_ttl: Duration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Push one event per resolution into hour-bucketed cache lists
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Appended to every sourced reply
    pub comment_footer: String,
    /// Reply used when no source could be found
    pub not_found: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    #[serde(with = "duration_serde::duration")]
    pub poll_interval: Duration,
    /// Posts listed per multireddit per cycle
    pub submission_limit: u32,
    /// Stop paging a multireddit after this many already-saved posts
    pub saved_stop_threshold: usize,
    /// Subreddits joined into one multireddit request
    pub multireddit_size: usize,
}

fn parse_default_duration(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or_default()
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            auth_url: DEFAULT_REDDIT_AUTH_URL.to_string(),
            api_url: DEFAULT_REDDIT_API_URL.to_string(),
        }
    }
}

impl Default for SauceNaoConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_SAUCENAO_BASE_URL.to_string(),
            results: DEFAULT_SAUCENAO_RESULTS,
            request_timeout: parse_default_duration(DEFAULT_SAUCENAO_TIMEOUT),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            found_ttl: parse_default_duration(DEFAULT_FOUND_TTL),
            not_found_ttl: parse_default_duration(DEFAULT_NOT_FOUND_TTL),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            comment_footer: DEFAULT_COMMENT_FOOTER.to_string(),
            not_found: DEFAULT_NOT_FOUND.to_string(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll_interval: parse_default_duration(DEFAULT_POLL_INTERVAL),
            submission_limit: DEFAULT_SUBMISSION_LIMIT,
            saved_stop_threshold: DEFAULT_SAVED_STOP_THRESHOLD,
            multireddit_size: DEFAULT_MULTIREDDIT_SIZE,
        }
    }
}

impl Config {
    /// Layer defaults, the TOML file (if present) and `SAUCEBOT_*` environment
    /// variables, in that order. Nested keys use `__`, e.g.
    /// `SAUCEBOT_SAUCENAO__API_KEY`.
    pub fn load(config_file: &str) -> AppResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if Path::new(config_file).exists() {
            info!("Loading configuration from {}", config_file);
            figment = figment.merge(Toml::file(config_file));
        } else {
            warn!(
                "Config file {} not found, using defaults and environment",
                config_file
            );
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract a config from an already assembled figment
    pub fn extract(figment: Figment) -> AppResult<Self> {
        figment
            .extract()
            .map_err(|e| AppError::configuration(e.to_string()))
    }

    /// Check the settings every command needs
    pub fn validate_lookup(&self) -> AppResult<()> {
        let mut missing = Vec::new();
        if self.saucenao.api_key.trim().is_empty() {
            missing.push("saucenao.api_key");
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.trim().is_empty() {
            missing.push("cache.redis_url");
        }
        Self::report_missing(missing)
    }

    /// Check the settings the polling bot needs on top of lookups
    pub fn validate_bot(&self) -> AppResult<()> {
        self.validate_lookup()?;

        let reddit = &self.reddit;
        let missing = [
            ("reddit.username", &reddit.username),
            ("reddit.password", &reddit.password),
            ("reddit.client_id", &reddit.client_id),
            ("reddit.client_secret", &reddit.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        Self::report_missing(missing)?;

        if self.bot.multireddit_size == 0 {
            return Err(AppError::configuration("bot.multireddit_size must be at least 1"));
        }
        Ok(())
    }

    fn report_missing(missing: Vec<&str>) -> AppResult<()> {
        if missing.is_empty() {
            return Ok(());
        }
        for name in &missing {
            warn!("`{}` is missing from configuration", name);
        }
        Err(AppError::configuration(format!(
            "missing required settings: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.found_ttl, Duration::from_secs(7 * 86400));
        assert_eq!(config.cache.not_found_ttl, Duration::from_secs(3 * 3600));
        assert_eq!(config.bot.poll_interval, Duration::from_secs(15));
        assert_eq!(config.bot.multireddit_size, 200);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_load_merges_file_and_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "sauce-bot.toml",
                r#"
                [saucenao]
                api_key = "from-file"
                results = 4

                [cache]
                backend = "memory"
                not_found_ttl = "1h"
                "#,
            )?;
            jail.set_env("SAUCEBOT_SAUCENAO__API_KEY", "from-env");
            jail.set_env("SAUCEBOT_METRICS__ENABLED", "true");

            let config = Config::load("sauce-bot.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.saucenao.api_key, "from-env");
            assert_eq!(config.saucenao.results, 4);
            assert_eq!(config.cache.backend, CacheBackend::Memory);
            assert_eq!(config.cache.not_found_ttl, Duration::from_secs(3600));
            assert_eq!(config.cache.found_ttl, Duration::from_secs(7 * 86400));
            assert!(config.metrics.enabled);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load("absent.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.saucenao.base_url, DEFAULT_SAUCENAO_BASE_URL);
            Ok(())
        });
    }

    #[test]
    fn test_validation_reports_missing_credentials() {
        let mut config = Config::default();
        let err = config.validate_lookup().unwrap_err().to_string();
        assert!(err.contains("saucenao.api_key"));

        config.saucenao.api_key = "key".to_string();
        assert!(config.validate_lookup().is_ok());

        let err = config.validate_bot().unwrap_err().to_string();
        assert!(err.contains("reddit.username"));
        assert!(err.contains("reddit.client_secret"));
    }
}
