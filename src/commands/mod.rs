//! Command implementations for the rdlc CLI.
//!
//! This module contains the business logic for each CLI command.
//! Commands are organized by entity type:
//! - `init`, `import`, `status` - database lifecycle (this module)
//! - `stage` - stages, substages, exemplars, and the lifecycle graph
//! - `tool` - tool CRUD operations

mod stage;
mod tool;

pub use stage::{
    ExemplarList, GraphResult, StageDetail, StageList, SubStageList, exemplars, graph,
    load_graph, stage_list, stage_show, substage_list,
};
pub use tool::{ToolDeleted, ToolList, ToolResult, tool_add, tool_delete, tool_list, tool_show, tool_update};

use crate::storage::{ImportReport, Storage, StorageCounts};
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Build metadata injected by build.rs.
pub const GIT_COMMIT: &str = env!("RDLC_GIT_COMMIT");
pub const BUILD_TIMESTAMP: &str = env!("RDLC_BUILD_TIMESTAMP");

/// Open the database for a command.
pub(crate) fn open_storage(db: &Path) -> Result<Storage> {
    Storage::open(db)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

// === Init ===

#[derive(Serialize)]
pub struct InitResult {
    pub database: PathBuf,
    /// True if the database file did not exist before
    pub created: bool,
    pub stages: usize,
    pub connections_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportReport>,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{} {}",
            if self.created {
                "Created"
            } else {
                "Updated"
            },
            self.database.display()
        )];
        lines.push(format!(
            "  {} stages, {} connections added",
            self.stages, self.connections_added
        ));
        if let Some(ref report) = self.import {
            lines.push(format_import(report));
        }
        lines.join("\n")
    }
}

/// Create the database, seed the canonical stages and wiring, and optionally
/// import a lifecycle sheet. `force` deletes an existing database first.
pub fn init(db: &Path, csv: Option<&Path>, force: bool) -> Result<InitResult> {
    if force && Storage::exists(db) {
        fs::remove_file(db)?;
        tracing::info!(path = %db.display(), "deleted existing database");
    }

    let created = !Storage::exists(db);
    let mut storage = Storage::init(db)?;
    let stages = storage.seed_canonical_stages()?;
    let connections_added = storage.seed_default_connections()?;

    let import = match csv {
        Some(path) => Some(storage.import_csv_file(path, false)?),
        None => None,
    };

    Ok(InitResult {
        database: db.to_path_buf(),
        created,
        stages,
        connections_added,
        import,
    })
}

// === Import ===

#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub database: PathBuf,
    pub source: PathBuf,
    pub replaced: bool,
    #[serde(flatten)]
    pub report: ImportReport,
}

impl Output for ImportResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Imported {} into {}{}\n{}",
            self.source.display(),
            self.database.display(),
            if self.replaced {
                " (replaced existing substages and tools)"
            } else {
                ""
            },
            format_import(&self.report)
        )
    }
}

fn format_import(report: &ImportReport) -> String {
    format!(
        "  {} substages, {} tools, {} new stages, {} rows skipped",
        report.substages, report.tools, report.stages_created, report.skipped_rows
    )
}

/// Import a lifecycle sheet into an existing database.
pub fn import(db: &Path, csv: &Path, replace: bool) -> Result<ImportResult> {
    if !csv.is_file() {
        return Err(Error::NotFound(format!("CSV file not found: {}", csv.display())));
    }

    let mut storage = open_storage(db)?;
    let report = storage.import_csv_file(csv, replace)?;

    Ok(ImportResult {
        database: db.to_path_buf(),
        source: csv.to_path_buf(),
        replaced: replace,
        report,
    })
}

// === Status ===

#[derive(Serialize)]
pub struct StatusResult {
    pub database: PathBuf,
    #[serde(flatten)]
    pub counts: StorageCounts,
    pub version: &'static str,
    pub commit: &'static str,
    pub built_at: &'static str,
}

impl Output for StatusResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Database: {}\n  Stages: {}\n  Substages: {}\n  Tools: {}\n  Connections: {}\nrdlc {} ({}, built {})",
            self.database.display(),
            self.counts.stages,
            self.counts.substages,
            self.counts.tools,
            self.counts.connections,
            self.version,
            self.commit,
            self.built_at
        )
    }
}

/// Report the database location and row counts.
pub fn status(db: &Path) -> Result<StatusResult> {
    let storage = open_storage(db)?;
    Ok(StatusResult {
        database: db.to_path_buf(),
        counts: storage.counts()?,
        version: env!("CARGO_PKG_VERSION"),
        commit: GIT_COMMIT,
        built_at: BUILD_TIMESTAMP,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    const SHEET: &str = "\
RESEARCH DATA LIFECYCLE STAGE,TOOL CATEGORY TYPE,DESCRIPTION (1 SENTENCE),EXAMPLES
PLAN,Data management plans,Write a DMP,\"DMPonline, DMPTool\"
";

    #[test]
    fn test_init_seeds_database() {
        let env = TestEnv::new();
        let result = init(&env.db_path(), None, false).unwrap();
        assert!(result.created);
        assert_eq!(result.stages, 12);
        assert_eq!(result.connections_added, 15);
        assert!(result.import.is_none());

        let again = init(&env.db_path(), None, false).unwrap();
        assert!(!again.created);
        assert_eq!(again.connections_added, 0);
    }

    #[test]
    fn test_init_with_csv_imports() {
        let env = TestEnv::new();
        let csv = env.write_csv("sheet.csv", SHEET);
        let result = init(&env.db_path(), Some(&csv), false).unwrap();
        assert_eq!(result.import.unwrap().tools, 2);
    }

    #[test]
    fn test_init_force_recreates() {
        let env = TestEnv::new();
        let csv = env.write_csv("sheet.csv", SHEET);
        init(&env.db_path(), Some(&csv), false).unwrap();

        let result = init(&env.db_path(), None, true).unwrap();
        assert!(result.created);
        assert_eq!(status(&env.db_path()).unwrap().counts.tools, 0);
    }

    #[test]
    fn test_import_requires_database() {
        let env = TestEnv::new();
        let csv = env.write_csv("sheet.csv", SHEET);
        assert!(matches!(
            import(&env.db_path(), &csv, false),
            Err(Error::NotInitialized(_))
        ));
    }

    #[test]
    fn test_import_missing_csv() {
        let env = TestEnv::new();
        init(&env.db_path(), None, false).unwrap();
        let missing = env.path().join("missing.csv");
        assert!(matches!(
            import(&env.db_path(), &missing, false),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_import_replace_clears_previous_rows() {
        let env = TestEnv::new();
        let csv = env.write_csv("sheet.csv", SHEET);
        init(&env.db_path(), None, false).unwrap();

        import(&env.db_path(), &csv, false).unwrap();
        import(&env.db_path(), &csv, false).unwrap();
        assert_eq!(status(&env.db_path()).unwrap().counts.tools, 4);

        let result = import(&env.db_path(), &csv, true).unwrap();
        assert!(result.replaced);
        assert_eq!(status(&env.db_path()).unwrap().counts.tools, 2);
    }

    #[test]
    fn test_failed_replace_import_keeps_tools() {
        let env = TestEnv::new();
        let good = env.write_csv("sheet.csv", SHEET);
        let bad = env.write_csv("bad.csv", "RESEARCH DATA LIFECYCLE STAGE,EXAMPLES\nPLAN,DMPonline\n");
        init(&env.db_path(), Some(&good), false).unwrap();

        let err = import(&env.db_path(), &bad, true).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let counts = status(&env.db_path()).unwrap().counts;
        assert_eq!(counts.tools, 2);
        assert_eq!(counts.substages, 1);
    }

    #[test]
    fn test_status_output() {
        let env = TestEnv::new();
        init(&env.db_path(), None, false).unwrap();
        let result = status(&env.db_path()).unwrap();

        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(json["stages"], 12);
        assert_eq!(json["connections"], 15);
        assert!(result.to_human().contains("Stages: 12"));
    }
}
