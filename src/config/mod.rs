//! Configuration for rdlc.
//!
//! Settings live in a KDL file, `rdlc.kdl` in the working directory or
//! `~/.config/rdlc/config.kdl`:
//!
//! - `database` - SQLite file holding the lifecycle taxonomy
//! - `host` / `port` - dashboard bind address
//! - `log-level` - `tracing` filter directive
//! - `output-format` - "json" or "human"
//! - `title` - dashboard page title
//!
//! ## Precedence
//!
//! CLI flag (or its env var) > config file > defaults.
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, LOCAL_CONFIG_FILE, Resolved, ResolvedConfig, ValueSource, locate_config_file,
    resolve_config, resolve_with, system_config_path,
};
pub use schema::{
    DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_PORT, DEFAULT_TITLE, OutputFormat,
    RdlcConfig,
};
