//! Configuration for addon-import.
//!
//! Settings are layered: built-in defaults, then the optional TOML file
//! (`~/.addon-import.toml` or `$ADDON_IMPORT_CONFIG`), then environment
//! variables, then command-line flags.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::addons::DEFAULT_STORE_FILE;
use crate::logging::LogConfig;

/// Default network fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Maximum config file size (64KB).
const MAX_CONFIG_SIZE: u64 = 64 * 1024;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "ADDON_IMPORT_CONFIG";

/// Environment variable that turns manifest validation off when set.
pub const NO_VALIDATE_ENV: &str = "ADDON_IMPORT_NO_VALIDATE";

/// Environment variable overriding the store path.
pub const STORE_ENV: &str = "ADDON_IMPORT_STORE";

/// Errors reading the config file or the command line.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// File too large.
    #[error("Config file too large (max {MAX_CONFIG_SIZE} bytes)")]
    FileTooLarge,

    /// A flag that needs a value was last on the command line.
    #[error("Missing value for {0}")]
    MissingValue(String),

    /// A flag value could not be parsed.
    #[error("Invalid value for {flag}: {value}")]
    InvalidValue {
        /// Flag name.
        flag: String,
        /// Offending value.
        value: String,
    },
}

/// On-disk config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    store: Option<PathBuf>,
    validate: Option<bool>,
    timeout_secs: Option<u64>,
    log_level: Option<String>,
    log_file: Option<bool>,
    log_retention_hours: Option<u32>,
}

/// What the command line asks for once flags are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliRequest {
    /// Print the version and exit.
    Version,
    /// Print usage and exit.
    Help,
    /// Import the remaining arguments as source batches.
    Import(Vec<String>),
}

/// Import configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Store file to merge into.
    pub store_path: PathBuf,
    /// Whether manifests are checked before merging.
    pub validate: bool,
    /// Network fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Logging configuration.
    pub log: LogConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            validate: true,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            log: LogConfig::default(),
        }
    }
}

impl ImportConfig {
    /// Returns the default config file path (`~/.addon-import.toml`).
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".addon-import.toml")
    }

    /// Loads defaults, the config file and the environment.
    ///
    /// A missing config file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);

        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Loads defaults overlaid with the config file at `path`, if it exists.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if !path.exists() {
            return Ok(config);
        }

        if fs::metadata(path)?.len() > MAX_CONFIG_SIZE {
            return Err(ConfigError::FileTooLarge);
        }

        let content = fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;
        config.apply_file(file)?;

        tracing::debug!("[CONFIG] Loaded {}", path.display());
        Ok(config)
    }

    /// Applies config file values.
    fn apply_file(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        if let Some(store) = file.store {
            self.store_path = store_path("store", store.into_os_string())?;
        }
        if let Some(validate) = file.validate {
            self.validate = validate;
        }
        if let Some(timeout) = file.timeout_secs {
            self.fetch_timeout_secs = timeout;
        }
        if let Some(level) = file.log_level {
            self.log.level = LogConfig::parse_level(&level);
        }
        if let Some(enabled) = file.log_file {
            self.log.file_enabled = enabled;
        }
        if let Some(hours) = file.log_retention_hours {
            self.log.retention_hours = hours;
        }
        Ok(())
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(NO_VALIDATE_ENV) {
            self.validate = !is_truthy(&value);
        }
        if let Some(store) = lookup(STORE_ENV).filter(|s| !s.trim().is_empty()) {
            self.store_path = PathBuf::from(store);
        }
    }

    /// Applies command-line flags and says what the command line asks for.
    ///
    /// Recognized: `--version`/`-v`, `--help`/`-h`, `--no-validate`,
    /// `--store <path>`, `--timeout <secs>`, `--log-level <level>`,
    /// `--log-file`, `--log-retention <hours>`. Everything else is kept in
    /// order as source batches. A flag value is never read as a flag.
    pub fn apply_args<I>(&mut self, args: I) -> Result<CliRequest, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut rest = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--version" | "-v" => return Ok(CliRequest::Version),
                "--help" | "-h" => return Ok(CliRequest::Help),
                "--no-validate" => self.validate = false,
                "--log-file" => self.log.file_enabled = true,
                "--store" => {
                    let value = next_value(&mut args, &arg)?;
                    self.store_path = store_path(&arg, value.into())?;
                }
                "--timeout" => {
                    let value = next_value(&mut args, &arg)?;
                    self.fetch_timeout_secs =
                        value.parse().map_err(|_| ConfigError::InvalidValue {
                            flag: arg.clone(),
                            value,
                        })?;
                }
                "--log-level" => {
                    self.log.level = LogConfig::parse_level(&next_value(&mut args, &arg)?);
                }
                "--log-retention" => {
                    self.log.retention_hours =
                        LogConfig::parse_retention(&next_value(&mut args, &arg)?);
                }
                _ => rest.push(arg),
            }
        }

        Ok(CliRequest::Import(rest))
    }

    /// Returns the fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn store_path(flag: &str, value: OsString) -> Result<PathBuf, ConfigError> {
    if value.to_string_lossy().trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: value.to_string_lossy().into_owned(),
        });
    }
    Ok(PathBuf::from(value))
}

fn next_value<I>(args: &mut I, flag: &str) -> Result<String, ConfigError>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}
