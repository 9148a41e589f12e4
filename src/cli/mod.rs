//! CLI argument definitions for rdlc.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rdlc - Research Data Lifecycle dashboard.
///
/// Start with `rdlc init --csv <sheet.csv>` to build the database, then
/// `rdlc serve` to open the dashboard.
#[derive(Parser, Debug)]
#[command(name = "rdlc")]
#[command(author, version, about = "Explore and curate the research data lifecycle", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// SQLite database file (default: research_data_lifecycle.db)
    #[arg(long = "db", global = true, env = "RDLC_DB")]
    pub database: Option<PathBuf>,

    /// Config file to read instead of ./rdlc.kdl or the user config
    #[arg(long, global = true, env = "RDLC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. "debug" or "rdlc=debug,tower_http=info"
    #[arg(long = "log-level", global = true, env = crate::logging::LOG_ENV)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and seed the twelve lifecycle stages
    Init {
        /// Import a CSV export of the lifecycle sheet after seeding
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Delete an existing database first
        #[arg(long)]
        force: bool,
    },

    /// Import a CSV export of the lifecycle sheet
    Import {
        /// Path to the CSV file
        csv: PathBuf,

        /// Remove existing substages and tools before importing
        #[arg(long)]
        replace: bool,
    },

    /// Show database location and record counts
    Status,

    /// Lifecycle stage commands
    Stage {
        #[command(subcommand)]
        command: StageCommands,
    },

    /// Show the lifecycle graph
    Graph {
        /// Stage to highlight
        #[arg(short, long)]
        select: Option<String>,
    },

    /// Substage commands
    Substage {
        #[command(subcommand)]
        command: SubstageCommands,
    },

    /// Tool management commands
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },

    /// Start the web dashboard (requires 'gui' feature)
    #[cfg(feature = "gui")]
    Serve {
        /// Port to listen on (default: 8050)
        #[arg(short, long, env = "RDLC_PORT")]
        port: Option<u16>,

        /// Host address to bind to (use 0.0.0.0 for network access)
        #[arg(long, env = "RDLC_HOST")]
        host: Option<String>,
    },
}

/// Stage subcommands
#[derive(Subcommand, Debug)]
pub enum StageCommands {
    /// List stages in cycle order
    List,

    /// Show a stage with its substages and tools
    Show {
        /// Stage name (case-insensitive, e.g. "collect")
        name: String,
    },
}

/// Substage subcommands
#[derive(Subcommand, Debug)]
pub enum SubstageCommands {
    /// List substages
    List {
        /// Only substages of this stage
        #[arg(long)]
        stage: Option<String>,
    },

    /// List the exemplar tools named by a substage
    Exemplars {
        /// Substage ID
        id: i64,
    },
}

/// Tool subcommands
#[derive(Subcommand, Debug)]
pub enum ToolCommands {
    /// List tools
    List {
        /// Only tools of this stage
        #[arg(long)]
        stage: Option<String>,
    },

    /// Add a tool to a stage
    Add {
        /// Tool name
        name: String,

        /// Stage the tool belongs to
        #[arg(short, long)]
        stage: String,

        /// Short description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Homepage URL (http or https)
        #[arg(short, long, default_value = "")]
        link: String,

        /// Organisation providing the tool
        #[arg(short, long, default_value = "")]
        provider: String,
    },

    /// Show a tool
    Show {
        /// Tool ID
        id: i64,
    },

    /// Update a tool (only the given fields change)
    Update {
        /// Tool ID
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New stage
        #[arg(short, long)]
        stage: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New homepage URL
        #[arg(short, long)]
        link: Option<String>,

        /// New provider
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Delete a tool
    Delete {
        /// Tool ID
        id: i64,
    },
}
