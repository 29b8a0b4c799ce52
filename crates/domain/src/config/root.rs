use serde::{Deserialize, Serialize};

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::lists::ListsConfig;
use super::logging::LoggingConfig;
use super::rewrite::RewriteConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;

const LOCAL_CONFIG: &str = "steer-dns.toml";
const SYSTEM_CONFIG: &str = "/etc/steer-dns/config.toml";

/// Main configuration structure for Steer DNS
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (port, bind address)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream list, timeout and retry budget
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// CDN range and candidate pool list files
    #[serde(default)]
    pub lists: ListsConfig,

    /// Persistent replacement cache
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. steer-dns.toml in current directory
    /// 3. /etc/steer-dns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path.map(str::to_string).or_else(Self::get_config_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::Parse("<inline>".to_string(), e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_string(), e.to_string()))
    }

    /// Apply command-line overrides to configuration
    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(file) = overrides.upstream_file {
            self.upstream.servers_file = file;
        }
        if let Some(cache) = overrides.cache_path {
            self.cache.path = cache;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }
        if self.server.tcp_idle_timeout == 0 {
            return Err(ConfigError::Validation(
                "TCP idle timeout must be greater than 0".to_string(),
            ));
        }
        if self.upstream.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Upstream query timeout must be greater than 0".to_string(),
            ));
        }
        if self.rewrite.replacement_count == 0 {
            return Err(ConfigError::Validation(
                "Replacement count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        [LOCAL_CONFIG, SYSTEM_CONFIG]
            .into_iter()
            .find(|p| std::path::Path::new(p).exists())
            .map(str::to_string)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub upstream_file: Option<String>,
    pub cache_path: Option<String>,
    pub log_level: Option<String>,
}
