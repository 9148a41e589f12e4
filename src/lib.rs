//! rdlc - Research data lifecycle dashboard.
//!
//! This library provides the core functionality for the `rdlc` CLI tool and
//! its web dashboard: the lifecycle taxonomy models, SQLite persistence, the
//! spreadsheet importer, and the graph projection behind the lifecycle diagram.

pub mod cli;
pub mod commands;
pub mod config;
#[cfg(feature = "gui")]
pub mod gui;
pub mod logging;
pub mod models;
pub mod storage;


/// Library-level error type for rdlc operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not initialized: run `rdlc init` first ({0})")]
    NotInitialized(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for rdlc operations.
pub type Result<T> = std::result::Result<T, Error>;
