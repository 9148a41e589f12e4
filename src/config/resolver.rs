//! Precedence resolution for configuration.
//!
//! ## Config file lookup (first match wins)
//!
//! 1. `--config` flag or `RDLC_CONFIG` environment variable (must exist)
//! 2. `./rdlc.kdl` in the working directory
//! 3. `<config_dir>/rdlc/config.kdl` (e.g. `~/.config/rdlc/config.kdl`)
//!
//! ## Value precedence (highest to lowest)
//!
//! 1. CLI flags (and their environment variables)
//! 2. Config file
//! 3. Built-in defaults

use super::schema::{
    DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_PORT, DEFAULT_TITLE, OutputFormat,
    RdlcConfig,
};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "rdlc.kdl";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag or its environment variable
    CliFlag,
    /// Value from a config file
    ConfigFile(PathBuf),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::ConfigFile(path) => write!(f, "file:{}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The config file that was read, if any
    pub file: Option<PathBuf>,
    pub database: Resolved<PathBuf>,
    pub host: Resolved<String>,
    pub port: Resolved<u16>,
    pub log_level: Resolved<String>,
    pub output_format: Resolved<OutputFormat>,
    pub title: Resolved<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            file: None,
            database: Resolved::new(PathBuf::from(DEFAULT_DATABASE), ValueSource::Default),
            host: Resolved::new(DEFAULT_HOST.to_string(), ValueSource::Default),
            port: Resolved::new(DEFAULT_PORT, ValueSource::Default),
            log_level: Resolved::new(DEFAULT_LOG_LEVEL.to_string(), ValueSource::Default),
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            title: Resolved::new(DEFAULT_TITLE.to_string(), ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn database(&self) -> &Path {
        &self.database.value
    }

    pub fn host(&self) -> &str {
        &self.host.value
    }

    pub fn port(&self) -> u16 {
        self.port.value
    }

    pub fn log_level(&self) -> &str {
        &self.log_level.value
    }

    pub fn output_format(&self) -> &OutputFormat {
        &self.output_format.value
    }

    pub fn title(&self) -> &str {
        &self.title.value
    }

    /// True when output should be human-readable.
    pub fn human(&self) -> bool {
        self.output_format.value == OutputFormat::Human
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Find the config file to read.
///
/// An explicit path must exist. Otherwise `cwd/rdlc.kdl` and then the
/// user config directory are tried; finding neither is not an error.
pub fn locate_config_file(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }

    Ok(system_config_path().filter(|p| p.is_file()))
}

/// `<config_dir>/rdlc/config.kdl`, if the platform has a config directory.
pub fn system_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rdlc").join("config.kdl"))
}

/// Resolve configuration from the located config file and CLI overrides.
pub fn resolve_config(
    explicit_file: Option<&Path>,
    cwd: &Path,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let file = locate_config_file(explicit_file, cwd)?;
    let loaded = match file {
        Some(ref path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            Some((path.clone(), RdlcConfig::load(path)?))
        }
        None => None,
    };
    resolve_with(loaded, overrides)
}

/// Resolve configuration from an already-loaded config file.
pub fn resolve_with(
    loaded: Option<(PathBuf, RdlcConfig)>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let mut result = ResolvedConfig::default();
    let (file_path, file_config) = match loaded {
        Some((path, config)) => (Some(path), config),
        None => (None, RdlcConfig::default()),
    };
    let from_file = || ValueSource::ConfigFile(file_path.clone().unwrap_or_default());

    // Relative database paths in a config file are relative to that file
    if let Some(ref database) = overrides.database {
        result.database = Resolved::new(database.clone(), ValueSource::CliFlag);
    } else if let Some(ref database) = file_config.database {
        let database = match file_path.as_ref().and_then(|p| p.parent()) {
            Some(dir) if database.is_relative() => dir.join(database),
            _ => database.clone(),
        };
        result.database = Resolved::new(database, from_file());
    }

    if let Some(ref host) = overrides.host {
        result.host = Resolved::new(host.clone(), ValueSource::CliFlag);
    } else if let Some(ref host) = file_config.host {
        result.host = Resolved::new(host.clone(), from_file());
    }

    if let Some(port) = overrides.port {
        result.port = Resolved::new(port, ValueSource::CliFlag);
    } else if let Some(port) = file_config.port {
        result.port = Resolved::new(port, from_file());
    }

    if let Some(ref level) = overrides.log_level {
        result.log_level = Resolved::new(level.clone(), ValueSource::CliFlag);
    } else if let Some(ref level) = file_config.log_level {
        result.log_level = Resolved::new(level.clone(), from_file());
    }

    if let Some(ref format) = overrides.output_format {
        result.output_format = Resolved::new(format.clone(), ValueSource::CliFlag);
    } else if let Some(ref format) = file_config.output_format {
        result.output_format = Resolved::new(format.clone(), from_file());
    }

    if let Some(ref title) = file_config.title {
        result.title = Resolved::new(title.clone(), from_file());
    }

    if result.port.value == 0 {
        return Err(Error::Config("port must be between 1 and 65535, got 0".to_string()));
    }
    crate::logging::validate_filter(&result.log_level.value).map_err(Error::Config)?;

    result.file = file_path;
    Ok(result)
}
