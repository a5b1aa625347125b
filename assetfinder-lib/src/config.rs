//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `AF_*`
//! environment variables, merging them with proper precedence rules and
//! folding the result into a `DiscoveryConfig`.

use crate::error::AssetFinderError;
use crate::sources::{parse_sources, Source};
use crate::types::{DiscoveryConfig, SourceCredentials};
use crate::utils::parse_duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// API credentials for keyed sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<SourceCredentials>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Keep only in-scope hostnames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subs_only: Option<bool>,

    /// Per-source rate limit interval (as string, e.g., "1s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,

    /// Per-source call deadline (as string, e.g., "30s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Maximum concurrent source calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Sources to query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,

    /// Log file for discovery runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Fold the file's values into `config`.
    ///
    /// Credentials from the file only fill gaps: a key already present
    /// (typically read from the environment) is kept.
    pub fn apply_to(
        &self,
        mut config: DiscoveryConfig,
    ) -> Result<DiscoveryConfig, AssetFinderError> {
        if let Some(defaults) = &self.defaults {
            if let Some(subs_only) = defaults.subs_only {
                config = config.with_subs_only(subs_only);
            }
            if let Some(rate_limit) = &defaults.rate_limit {
                config = config.with_rate_limit(duration_setting("rate_limit", rate_limit)?);
            }
            if let Some(timeout) = &defaults.timeout {
                config = config.with_source_timeout(duration_setting("timeout", timeout)?);
            }
            if let Some(concurrency) = defaults.concurrency {
                config = config.with_max_in_flight(concurrency);
            }
            if let Some(sources) = &defaults.sources {
                config = config.with_sources(parse_sources(sources)?);
            }
            if let Some(log_file) = &defaults.log_file {
                config = config.with_log_file(log_file);
            }
        }

        if let Some(credentials) = &self.credentials {
            let merged = config.credentials.clone().or(credentials.clone());
            config = config.with_credentials(merged);
        }

        Ok(config)
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `FileError` if the file is missing or unreadable and
    /// `ConfigError` if it is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, AssetFinderError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(AssetFinderError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            AssetFinderError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            AssetFinderError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config < `~/.assetfinder.toml` < `./assetfinder.toml`. Files that
    /// do not exist are skipped; a file that exists but is broken is an error.
    pub fn discover_and_load(&self) -> Result<FileConfig, AssetFinderError> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
            loaded_files.push(path);
        }

        if self.verbose {
            for path in &loaded_files {
                info!(path = %path.display(), "loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./assetfinder.toml", "./.assetfinder.toml"]
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;

        [".assetfinder.toml", "assetfinder.toml"]
            .into_iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("assetfinder").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win field by field.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    subs_only: higher.subs_only.or(lower.subs_only),
                    rate_limit: higher.rate_limit.or(lower.rate_limit),
                    timeout: higher.timeout.or(lower.timeout),
                    concurrency: higher.concurrency.or(lower.concurrency),
                    sources: higher.sources.or(lower.sources),
                    log_file: higher.log_file.or(lower.log_file),
                }),
                (lower, higher) => higher.or(lower),
            },
            credentials: match (lower.credentials, higher.credentials) {
                (Some(lower), Some(higher)) => Some(higher.or(lower)),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), AssetFinderError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(concurrency) = defaults.concurrency {
            if concurrency == 0 || concurrency > 100 {
                return Err(AssetFinderError::config(
                    "Concurrency must be between 1 and 100",
                ));
            }
        }

        if let Some(rate_limit) = &defaults.rate_limit {
            duration_setting("rate_limit", rate_limit)?;
        }

        if let Some(timeout) = &defaults.timeout {
            duration_setting("timeout", timeout)?;
        }

        if let Some(sources) = &defaults.sources {
            if sources.is_empty() {
                return Err(AssetFinderError::config(
                    "The 'sources' list cannot be empty",
                ));
            }
            parse_sources(sources)?;
        }

        Ok(())
    }
}

fn duration_setting(name: &str, value: &str) -> Result<Duration, AssetFinderError> {
    parse_duration(value).ok_or_else(|| {
        AssetFinderError::config(format!(
            "Invalid {} format '{}'. Use format like '500ms', '5s', '2m'",
            name, value
        ))
    })
}

/// Environment variable configuration that mirrors CLI options.
///
/// Values are parsed and validated on load; anything invalid has already
/// been warned about and dropped.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub subs_only: Option<bool>,
    pub rate_limit: Option<Duration>,
    pub timeout: Option<Duration>,
    pub concurrency: Option<usize>,
    pub sources: Option<Vec<Source>>,
    pub log_file: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl EnvConfig {
    /// Read `AF_*` settings through `lookup`.
    pub fn from_lookup<F>(lookup: F, verbose: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_config = EnvConfig::default();
        let read = |name: &str| {
            let value = lookup(name).filter(|v| !v.trim().is_empty())?;
            if verbose {
                info!(variable = name, value = %value, "using environment setting");
            }
            Some(value)
        };

        // AF_SUBS_ONLY - keep only in-scope hostnames
        if let Some(val) = read("AF_SUBS_ONLY") {
            env_config.subs_only = parse_bool(&val);
            if env_config.subs_only.is_none() {
                warn!("Invalid AF_SUBS_ONLY='{}', use true/false", val);
            }
        }

        // AF_RATE_LIMIT - per-source interval
        if let Some(val) = read("AF_RATE_LIMIT") {
            env_config.rate_limit = parse_duration(&val);
            if env_config.rate_limit.is_none() {
                warn!("Invalid AF_RATE_LIMIT='{}', use format like '500ms', '1s'", val);
            }
        }

        // AF_TIMEOUT - per-source deadline
        if let Some(val) = read("AF_TIMEOUT") {
            env_config.timeout = parse_duration(&val);
            if env_config.timeout.is_none() {
                warn!("Invalid AF_TIMEOUT='{}', use format like '5s', '30s', '2m'", val);
            }
        }

        // AF_CONCURRENCY - concurrent source calls
        if let Some(val) = read("AF_CONCURRENCY") {
            match val.trim().parse::<usize>() {
                Ok(concurrency) if (1..=100).contains(&concurrency) => {
                    env_config.concurrency = Some(concurrency);
                }
                _ => warn!("Invalid AF_CONCURRENCY='{}', must be 1-100", val),
            }
        }

        // AF_SOURCES - comma-separated source names
        if let Some(val) = read("AF_SOURCES") {
            let names: Vec<&str> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            match parse_sources(&names) {
                Ok(sources) if !sources.is_empty() => env_config.sources = Some(sources),
                Ok(_) => warn!("Ignoring empty AF_SOURCES"),
                Err(e) => warn!("Ignoring AF_SOURCES='{}': {}", val, e),
            }
        }

        // AF_LOG_FILE - log file for discovery runs
        if let Some(val) = read("AF_LOG_FILE") {
            env_config.log_file = Some(PathBuf::from(val));
        }

        // AF_CONFIG - explicit config file
        if let Some(val) = read("AF_CONFIG") {
            env_config.config = Some(PathBuf::from(val));
        }

        env_config
    }

    /// Fold the environment's values into `config`.
    pub fn apply_to(&self, mut config: DiscoveryConfig) -> DiscoveryConfig {
        if let Some(subs_only) = self.subs_only {
            config = config.with_subs_only(subs_only);
        }
        if let Some(rate_limit) = self.rate_limit {
            config = config.with_rate_limit(rate_limit);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_source_timeout(timeout);
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_max_in_flight(concurrency);
        }
        if let Some(sources) = &self.sources {
            config = config.with_sources(sources.clone());
        }
        if let Some(log_file) = &self.log_file {
            config = config.with_log_file(log_file);
        }
        config
    }
}

/// Load configuration from `AF_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    EnvConfig::from_lookup(|name| env::var(name).ok(), verbose)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
