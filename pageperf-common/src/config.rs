//! Report configuration loading
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `PAGEPERF_CONFIG` environment variable
//! 3. `<config dir>/pageperf/config.toml`
//! 4. Built-in defaults
//!
//! A missing config file is not fatal: a warning is logged and defaults are
//! used. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PAGEPERF_CONFIG";

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Perf dashboard text lines
    #[default]
    Buildbot,
    /// One row per page
    Csv,
    /// Single JSON document
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buildbot" => Some(OutputFormat::Buildbot),
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Buildbot => "buildbot",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Report settings loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportConfig {
    pub output_format: OutputFormat,

    /// Appended to merged trace names; suppresses per-page buildbot lines
    pub trace_tag: String,

    /// CSV only: write each page's row as soon as the page finishes
    pub output_after_every_page: bool,

    /// Merge `x.z` and `y.z` into one value named `z`
    pub group_by_name_suffix: bool,

    pub logging: LoggingConfig,
}

impl ReportConfig {
    /// Resolve the config file and load it, falling back to defaults
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) => load_config_file(&path),
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject settings that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level '{}', expected one of {:?}",
                self.logging.level, VALID_LOG_LEVELS
            )));
        }
        for setting in self.ignored_settings() {
            warn!(
                "{} does not apply to {} output and is ignored",
                setting, self.output_format
            );
        }
        Ok(())
    }

    /// Enabled settings that the chosen output format does not use
    ///
    /// `output_after_every_page` only affects csv; `group_by_name_suffix`
    /// only affects json.
    pub fn ignored_settings(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.output_after_every_page && self.output_format != OutputFormat::Csv {
            ignored.push("output_after_every_page");
        }
        if self.group_by_name_suffix && self.output_format != OutputFormat::Json {
            ignored.push("group_by_name_suffix");
        }
        ignored
    }
}

/// Pick the config file path by priority
///
/// The default location is only returned when a file exists there.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Default location
    default_config_path().filter(|p| p.exists())
}

/// `<config dir>/pageperf/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pageperf").join("config.toml"))
}

/// Load and validate a config file
///
/// A file that does not exist yields defaults with a warning.
pub fn load_config_file(path: &Path) -> Result<ReportConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(ReportConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: ReportConfig = toml::from_str(&content)?;
    config.validate()?;
    debug!(path = %path.display(), format = %config.output_format, "Loaded config file");
    Ok(config)
}
