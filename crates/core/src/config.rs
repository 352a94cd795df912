use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub audit: AuditConfig,
    pub rate_limit: RateLimitConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditConfig {
    pub log_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

/// Optional paths to injected product/order datasets. When absent the demo
/// fixtures are served.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataConfig {
    pub products_path: Option<PathBuf>,
    pub orders_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 3001 },
            audit: AuditConfig { log_path: PathBuf::from("audit.log") },
            rate_limit: RateLimitConfig { window_secs: 15 * 60, max_requests: 10 },
            data: DataConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    audit: Option<AuditPatch>,
    rate_limit: Option<RateLimitPatch>,
    data: Option<DataPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct AuditPatch {
    log_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RateLimitPatch {
    window_secs: Option<u64>,
    max_requests: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    products_path: Option<PathBuf>,
    orders_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("storebot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }
        if let Some(audit) = patch.audit {
            if let Some(log_path) = audit.log_path {
                self.audit.log_path = log_path;
            }
        }
        if let Some(rate_limit) = patch.rate_limit {
            if let Some(window_secs) = rate_limit.window_secs {
                self.rate_limit.window_secs = window_secs;
            }
            if let Some(max_requests) = rate_limit.max_requests {
                self.rate_limit.max_requests = max_requests;
            }
        }
        if let Some(data) = patch.data {
            if let Some(products_path) = data.products_path {
                self.data.products_path = Some(products_path);
            }
            if let Some(orders_path) = data.orders_path {
                self.data.orders_path = Some(orders_path);
            }
        }
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(bind_address) = env_string("STOREBOT_BIND_ADDRESS") {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = env_parsed::<u16>("STOREBOT_PORT")? {
            self.server.port = port;
        }
        if let Some(log_path) = env_string("STOREBOT_AUDIT_LOG") {
            self.audit.log_path = PathBuf::from(log_path);
        }
        if let Some(window_secs) = env_parsed::<u64>("STOREBOT_RATE_LIMIT_WINDOW_SECS")? {
            self.rate_limit.window_secs = window_secs;
        }
        if let Some(max_requests) = env_parsed::<u32>("STOREBOT_RATE_LIMIT_MAX")? {
            self.rate_limit.max_requests = max_requests;
        }
        if let Some(products_path) = env_string("STOREBOT_PRODUCTS_PATH") {
            self.data.products_path = Some(PathBuf::from(products_path));
        }
        if let Some(orders_path) = env_string("STOREBOT_ORDERS_PATH") {
            self.data.orders_path = Some(PathBuf::from(orders_path));
        }
        if let Some(level) = env_string("STOREBOT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_string("STOREBOT_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation("server.bind_address must not be empty".into()));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Validation("rate_limit.window_secs must be >= 1".into()));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Validation("rate_limit.max_requests must be >= 1".into()));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("storebot.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_string(key) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigError, LoadOptions, LogFormat};

    #[test]
    fn defaults_match_the_served_contract() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.rate_limit.window_secs, 900);
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[server]\nport = 8080\n\n[rate_limit]\nmax_requests = 3\n\n[logging]\nformat = \"json\""
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
        })
        .expect("config should load");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.logging.format, LogFormat::Json);
        // Untouched sections keep defaults.
        assert_eq!(config.rate_limit.window_secs, 900);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn zero_rate_limit_window_fails_validation() {
        let mut config = AppConfig::default();
        config.rate_limit.window_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().expect("parses"), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
