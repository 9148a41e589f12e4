//! KDL schema for the rdlc config file.
//!
//! This module provides:
//! - The `RdlcConfig` struct representing the KDL schema
//! - Parsing from KDL format
//! - Validation
//! - Built-in defaults

use crate::{Error, Result};
use kdl::KdlDocument;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "research_data_lifecycle.db";

/// Default address the dashboard binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default dashboard port.
pub const DEFAULT_PORT: u16 = 8050;

/// Default log filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default dashboard title.
pub const DEFAULT_TITLE: &str = "Research Data Lifecycle";

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings stored in `rdlc.kdl`.
///
/// # KDL Schema
///
/// ```kdl
/// database "data/research_data_lifecycle.db"
/// host "0.0.0.0"
/// port 8050
/// log-level "rdlc=debug,tower_http=info"
/// output-format "human"
/// title "Research Data Lifecycle"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdlcConfig {
    /// Database file location
    pub database: Option<PathBuf>,

    /// Dashboard bind address
    pub host: Option<String>,

    /// Dashboard port
    pub port: Option<u16>,

    /// `tracing` filter directive (e.g. "debug" or "rdlc=debug")
    pub log_level: Option<String>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Dashboard page title
    pub title: Option<String>,
}

impl RdlcConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.port == Some(0) {
            return Err("port must be between 1 and 65535, got 0".to_string());
        }
        if let Some(ref host) = self.host {
            if host.parse::<std::net::IpAddr>().is_err() {
                return Err(format!("host must be an IP address, got '{}'", host));
            }
        }
        if let Some(ref level) = self.log_level {
            crate::logging::validate_filter(level)?;
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes and values of the
    /// wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(s) = first_string(doc, "database") {
            config.database = Some(PathBuf::from(s));
        }

        if let Some(s) = first_string(doc, "host") {
            config.host = Some(s.to_string());
        }

        if let Some(node) = doc.get("port") {
            if let Some(entry) = node.entries().first() {
                if let Some(i) = entry.value().as_integer() {
                    if (0..=u16::MAX as i128).contains(&i) {
                        config.port = Some(i as u16);
                    }
                }
            }
        }

        if let Some(s) = first_string(doc, "log-level") {
            config.log_level = Some(s.to_string());
        }

        if let Some(s) = first_string(doc, "output-format") {
            config.output_format = OutputFormat::parse(s);
        }

        if let Some(s) = first_string(doc, "title") {
            config.title = Some(s.to_string());
        }

        config
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let doc: KdlDocument = content
            .parse()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_kdl(&doc);
        config
            .validate()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }
}

fn first_string<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== OutputFormat Tests ====================

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(format!("{}", OutputFormat::Json), "json");
        assert_eq!(format!("{}", OutputFormat::Human), "human");
    }

    // ==================== RdlcConfig Tests ====================

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            database "data/lifecycle.db"
            host "0.0.0.0"
            port 9000
            log-level "debug"
            output-format "human"
            title "Lifecycle Atlas"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = RdlcConfig::from_kdl(&doc);

        assert_eq!(config.database, Some(PathBuf::from("data/lifecycle.db")));
        assert_eq!(config.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.title.as_deref(), Some("Lifecycle Atlas"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_kdl_ignores_wrong_types() {
        let kdl = r#"
            port "eighty"
            database 42
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = RdlcConfig::from_kdl(&doc);
        assert_eq!(config, RdlcConfig::default());
    }

    #[test]
    fn test_config_from_kdl_out_of_range_port() {
        let doc: KdlDocument = "port 70000".parse().unwrap();
        assert_eq!(RdlcConfig::from_kdl(&doc).port, None);
    }

    #[test]
    fn test_config_validate_rejects_bad_values() {
        let config = RdlcConfig {
            port: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RdlcConfig {
            host: Some("localhost:80".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RdlcConfig {
            log_level: Some("rdlc=loud".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rdlc.kdl");
        std::fs::write(&path, "port 0\n").unwrap();

        let err = RdlcConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("rdlc.kdl")));
    }

    #[test]
    fn test_load_rejects_malformed_kdl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rdlc.kdl");
        std::fs::write(&path, "port {{{\n").unwrap();
        assert!(matches!(RdlcConfig::load(&path), Err(Error::Config(_))));
    }
}
