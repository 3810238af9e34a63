//! Service configuration
//!
//! Defaults, then an optional TOML file, then environment variables, then
//! validation. Environment names match the deployment scripts
//! (`PORT`, `LOG_FILE`, `PROD_RNG_API_URL`, ...).

use crate::errors::{ConfigResult, ConfigurationError};
use crate::upstream::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete service configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub upstream: UpstreamConfig,
    pub game: GameConfig,
}

/// HTTP listener settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Must exceed `UpstreamConfig::worst_case_duration`
    pub request_timeout_secs: u64,
    /// Take the client IP from X-Forwarded-For instead of the peer address
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 11400,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 60,
            trust_forwarded_for: false,
        }
    }
}

/// Log destination and filter
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append logs here; stdout when unset
    pub log_file: Option<String>,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: Some("app.log".to_string()),
            filter: "kongspin=info,tower_http=info".to_string(),
        }
    }
}

/// URLs of one settings/RNG service pair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Endpoints {
    pub rng_url: String,
    pub settings_url: String,
}

/// Both service pairs plus the shared client policy
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub production: Endpoints,
    /// Used for requests whose Origin mentions "test"
    pub test: Endpoints,
    pub timeout_secs: u64,
    pub settings_max_retries: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            production: Endpoints {
                rng_url: "http://127.0.0.1:17003/api/proxy/rng/1".to_string(),
                settings_url: "http://127.0.0.1:17004/get-game-settings".to_string(),
            },
            test: Endpoints {
                rng_url: "http://test-rng-url".to_string(),
                settings_url: "https://test-settings-url".to_string(),
            },
            timeout_secs: 10,
            settings_max_retries: 3,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.settings_max_retries,
            ..RetryPolicy::default()
        }
    }

    /// Every settings attempt timing out, every backoff at its ceiling,
    /// then one RNG call timing out
    pub fn worst_case_duration(&self) -> Duration {
        let attempts = self.settings_max_retries.saturating_add(1);
        self.timeout()
            .saturating_mul(attempts)
            .saturating_add(self.retry_policy().total_backoff())
            .saturating_add(self.timeout())
    }
}

/// Which game this process serves
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Path segment accepted by `POST /spin/:game`
    pub name: String,
    /// Name reported by `/status`
    pub display_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "funkykingkong".to_string(),
            display_name: "funky-king-kong".to_string(),
        }
    }
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Read a TOML file before applying environment overrides
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load using the process environment
    pub fn load(&self) -> ConfigResult<ServiceConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn load_with_env<F>(&self, lookup: F) -> ConfigResult<ServiceConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.config_path {
            Some(ref path) => Self::load_from_file(path)?,
            None => ServiceConfig::default(),
        };

        apply_env_overrides(&mut config, lookup)?;
        validate(&config)?;

        Ok(config)
    }

    fn load_from_file(path: &str) -> ConfigResult<ServiceConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content).map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    /// Write a configuration as TOML
    pub fn save(config: &ServiceConfig, path: &str) -> ConfigResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to write to {}: {}", path, e)))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String, reason: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigurationError::InvalidValue {
        field: key.to_string(),
        value,
        reason: reason.to_string(),
    })
}

fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

    // Server
    if let Some(host) = non_empty("HOST") {
        config.server.host = host;
    }
    if let Some(port) = non_empty("PORT") {
        config.server.port = parse_var("PORT", port, "Invalid port number")?;
    }
    if let Some(timeout) = non_empty("REQUEST_TIMEOUT_SECS") {
        config.server.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", timeout, "Invalid timeout value")?;
    }
    if let Some(trust) = non_empty("TRUST_FORWARDED_FOR") {
        config.server.trust_forwarded_for = parse_var("TRUST_FORWARDED_FOR", trust, "Expected true or false")?;
    }

    // Logging
    if let Some(log_file) = non_empty("LOG_FILE") {
        config.logging.log_file = Some(log_file);
    }
    if let Some(filter) = non_empty("LOG_FILTER") {
        config.logging.filter = filter;
    }

    // Production services; the unprefixed names are the older spelling
    if let Some(url) = non_empty("PROD_RNG_API_URL").or_else(|| non_empty("RNG_API_URL")) {
        config.upstream.production.rng_url = url;
    }
    if let Some(url) = non_empty("PROD_SETTINGS_API_URL").or_else(|| non_empty("SETTINGS_API_URL")) {
        config.upstream.production.settings_url = url;
    }

    // Test services
    if let Some(url) = non_empty("TEST_RNG_API_URL") {
        config.upstream.test.rng_url = url;
    }
    if let Some(url) = non_empty("TEST_SETTINGS_API_URL") {
        config.upstream.test.settings_url = url;
    }

    if let Some(timeout) = non_empty("UPSTREAM_TIMEOUT_SECS") {
        config.upstream.timeout_secs = parse_var("UPSTREAM_TIMEOUT_SECS", timeout, "Invalid timeout value")?;
    }
    if let Some(retries) = non_empty("SETTINGS_MAX_RETRIES") {
        config.upstream.settings_max_retries = parse_var("SETTINGS_MAX_RETRIES", retries, "Invalid retry count")?;
    }

    Ok(())
}

/// Validate configuration values
pub fn validate(config: &ServiceConfig) -> ConfigResult<()> {
    if config.server.port == 0 {
        return Err(ConfigurationError::InvalidValue {
            field: "server.port".to_string(),
            value: "0".to_string(),
            reason: "Port cannot be zero".to_string(),
        });
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigurationError::InvalidValue {
            field: "server.request_timeout_secs".to_string(),
            value: "0".to_string(),
            reason: "Timeout cannot be zero".to_string(),
        });
    }

    if config.upstream.timeout_secs == 0 {
        return Err(ConfigurationError::InvalidValue {
            field: "upstream.timeout_secs".to_string(),
            value: "0".to_string(),
            reason: "Timeout cannot be zero".to_string(),
        });
    }

    let budget = config.upstream.worst_case_duration();
    if Duration::from_secs(config.server.request_timeout_secs) <= budget {
        return Err(ConfigurationError::InvalidValue {
            field: "server.request_timeout_secs".to_string(),
            value: config.server.request_timeout_secs.to_string(),
            reason: format!(
                "Must exceed the worst-case upstream time of {:.1}s so upstream failures are reported",
                budget.as_secs_f64()
            ),
        });
    }

    let urls = [
        ("upstream.production.rng_url", &config.upstream.production.rng_url),
        ("upstream.production.settings_url", &config.upstream.production.settings_url),
        ("upstream.test.rng_url", &config.upstream.test.rng_url),
        ("upstream.test.settings_url", &config.upstream.test.settings_url),
    ];
    for (field, url) in urls {
        if url.is_empty() {
            return Err(ConfigurationError::MissingRequired(field.to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigurationError::InvalidValue {
                field: field.to_string(),
                value: url.clone(),
                reason: "URL must use http or https".to_string(),
            });
        }
    }

    if config.game.name.is_empty() {
        return Err(ConfigurationError::MissingRequired("game.name".to_string()));
    }

    Ok(())
}
