//! Storage layer for the lifecycle taxonomy.
//!
//! A single SQLite file holds four tables:
//! - `lifecycle` - stages, keyed by their uppercase identifier
//! - `substages` - tool categories per stage, with raw exemplar lists
//! - `tools` - editable tool records
//! - `cycle_connects` - directed stage-to-stage connections
//!
//! Connections carry no foreign keys: a connection may name a
//! stage that does not exist, and the graph projection drops it.

pub mod import;

pub use import::ImportReport;

use crate::models::taxonomy::{canonical_stages, default_connections, stage_definition, stage_position};
use crate::models::{
    ConnectionKind, CycleConnection, NewTool, Stage, SubStage, Tool, ToolUpdate,
    normalize_stage_name,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCounts {
    pub stages: usize,
    pub substages: usize,
    pub tools: usize,
    pub connections: usize,
}

/// Storage manager for a single lifecycle database.
pub struct Storage {
    /// Location of the database file (":memory:" for in-memory databases)
    path: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Open an existing database file.
    pub fn open(path: &Path) -> Result<Self> {
        if !Self::exists(path) {
            return Err(Error::NotInitialized(path.display().to_string()));
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        tracing::debug!(path = %path.display(), "opened lifecycle database");

        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Create the database file and schema if they do not exist yet.
    pub fn init(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let created = !path.exists();
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        if created {
            tracing::info!(path = %path.display(), "created lifecycle database");
        }

        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Open a private in-memory database with the schema applied.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Check if a database file exists at `path`.
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Initialize the SQLite schema.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS lifecycle (
                stage TEXT PRIMARY KEY,
                stagedesc TEXT NOT NULL DEFAULT '',
                position INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS substages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                substagename TEXT NOT NULL,
                substagedesc TEXT NOT NULL DEFAULT '',
                exemplar TEXT NOT NULL DEFAULT '',
                stage TEXT NOT NULL,
                FOREIGN KEY (stage) REFERENCES lifecycle(stage) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tools (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                link TEXT NOT NULL DEFAULT '',
                provider TEXT NOT NULL DEFAULT '',
                stage TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (stage) REFERENCES lifecycle(stage) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS cycle_connects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_stage TEXT NOT NULL,
                end_stage TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'normal',
                UNIQUE (start_stage, end_stage, kind)
            );

            CREATE INDEX IF NOT EXISTS idx_lifecycle_position ON lifecycle(position);
            CREATE INDEX IF NOT EXISTS idx_substages_stage ON substages(stage);
            CREATE INDEX IF NOT EXISTS idx_tools_stage ON tools(stage);
            "#,
        )?;
        Ok(())
    }

    // === Stage Operations ===

    /// Insert a stage or replace the description and position of an existing one.
    pub fn upsert_stage(&mut self, stage: &Stage) -> Result<()> {
        self.conn.execute(
            "INSERT INTO lifecycle (stage, stagedesc, position) VALUES (?1, ?2, ?3)
             ON CONFLICT(stage) DO UPDATE SET stagedesc = excluded.stagedesc, position = excluded.position",
            params![normalize_stage_name(&stage.name), stage.description, stage.position],
        )?;
        Ok(())
    }

    /// Upsert the twelve canonical stages.
    pub fn seed_canonical_stages(&mut self) -> Result<usize> {
        let stages = canonical_stages();
        let tx = self.conn.transaction()?;
        for stage in &stages {
            tx.execute(
                "INSERT INTO lifecycle (stage, stagedesc, position) VALUES (?1, ?2, ?3)
                 ON CONFLICT(stage) DO UPDATE SET stagedesc = excluded.stagedesc, position = excluded.position",
                params![stage.name, stage.description, stage.position],
            )?;
        }
        tx.commit()?;
        Ok(stages.len())
    }

    /// List all stages in cycle order.
    pub fn list_stages(&self) -> Result<Vec<Stage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT stage, stagedesc, position FROM lifecycle ORDER BY position ASC, stage ASC")?;
        let stages = stmt
            .query_map([], stage_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stages)
    }

    /// Get a stage by identifier (case-insensitive).
    pub fn get_stage(&self, name: &str) -> Result<Stage> {
        let name = normalize_stage_name(name);
        self.conn
            .query_row(
                "SELECT stage, stagedesc, position FROM lifecycle WHERE stage = ?1",
                [&name],
                stage_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Stage not found: {}", name)))
    }

    // === Substage Operations ===

    /// Add a substage to an existing stage.
    pub fn add_substage(
        &mut self,
        name: &str,
        description: &str,
        exemplar: &str,
        stage: &str,
    ) -> Result<SubStage> {
        let stage = self.get_stage(stage)?.name;
        let id = insert_substage(&self.conn, name, description, exemplar, &stage)?;
        self.get_substage(id)
    }

    /// Get a substage by ID.
    pub fn get_substage(&self, id: i64) -> Result<SubStage> {
        self.conn
            .query_row(
                "SELECT id, substagename, substagedesc, exemplar, stage FROM substages WHERE id = ?1",
                [id],
                substage_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Substage not found: {}", id)))
    }

    /// List substages, optionally filtered by stage.
    pub fn list_substages(&self, stage: Option<&str>) -> Result<Vec<SubStage>> {
        let mut sql = String::from(
            "SELECT s.id, s.substagename, s.substagedesc, s.exemplar, s.stage
             FROM substages s
             LEFT JOIN lifecycle l ON l.stage = s.stage
             WHERE 1=1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(s) = stage {
            sql.push_str(" AND s.stage = ?");
            params_vec.push(Box::new(normalize_stage_name(s)));
        }

        sql.push_str(" ORDER BY l.position ASC, s.id ASC");

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let substages = stmt
            .query_map(params_refs.as_slice(), substage_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(substages)
    }

    // === Tool Operations ===

    /// Create a new tool and return the stored record.
    pub fn create_tool(&mut self, tool: &NewTool) -> Result<Tool> {
        tool.validate().map_err(Error::InvalidInput)?;
        let stage = self.get_stage(&tool.stage)?.name;

        let now = Utc::now();
        let id = insert_tool(
            &self.conn,
            tool.name.trim(),
            &tool.description,
            tool.link.trim(),
            &tool.provider,
            &stage,
            now,
        )?;
        tracing::debug!(id, name = %tool.name, stage = %stage, "created tool");

        self.get_tool(id)
    }

    /// Get a tool by ID.
    pub fn get_tool(&self, id: i64) -> Result<Tool> {
        self.conn
            .query_row(
                "SELECT id, name, description, link, provider, stage, created_at, updated_at
                 FROM tools WHERE id = ?1",
                [id],
                tool_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Tool not found: {}", id)))
    }

    /// List tools, optionally filtered by stage.
    pub fn list_tools(&self, stage: Option<&str>) -> Result<Vec<Tool>> {
        let mut sql = String::from(
            "SELECT t.id, t.name, t.description, t.link, t.provider, t.stage, t.created_at, t.updated_at
             FROM tools t
             LEFT JOIN lifecycle l ON l.stage = t.stage
             WHERE 1=1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(s) = stage {
            sql.push_str(" AND t.stage = ?");
            params_vec.push(Box::new(normalize_stage_name(s)));
        }

        sql.push_str(" ORDER BY l.position ASC, t.id ASC");

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let tools = stmt
            .query_map(params_refs.as_slice(), tool_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tools)
    }

    /// Apply a partial update to a tool and return the stored record.
    pub fn update_tool(&mut self, id: i64, update: &ToolUpdate) -> Result<Tool> {
        update.validate().map_err(Error::InvalidInput)?;

        let mut tool = self.get_tool(id)?;
        update.apply(&mut tool);
        if update.stage.is_some() {
            tool.stage = self.get_stage(&tool.stage)?.name;
        }
        tool.updated_at = Utc::now();

        self.conn.execute(
            "UPDATE tools SET name = ?1, description = ?2, link = ?3, provider = ?4, stage = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                tool.name,
                tool.description,
                tool.link,
                tool.provider,
                tool.stage,
                tool.updated_at.to_rfc3339(),
                id,
            ],
        )?;
        tracing::debug!(id, "updated tool");

        self.get_tool(id)
    }

    /// Delete a tool by ID.
    pub fn delete_tool(&mut self, id: i64) -> Result<()> {
        let affected = self.conn.execute("DELETE FROM tools WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(Error::NotFound(format!("Tool not found: {}", id)));
        }
        tracing::debug!(id, "deleted tool");
        Ok(())
    }

    // === Connection Operations ===

    /// Add a directed connection. Endpoints are not required to exist.
    pub fn add_connection(
        &mut self,
        start: &str,
        end: &str,
        kind: ConnectionKind,
    ) -> Result<CycleConnection> {
        let start = normalize_stage_name(start);
        let end = normalize_stage_name(end);
        if start.is_empty() || end.is_empty() {
            return Err(Error::InvalidInput(
                "Connection endpoints must not be empty".to_string(),
            ));
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO cycle_connects (start_stage, end_stage, kind) VALUES (?1, ?2, ?3)",
            params![start, end, kind.as_str()],
        )?;
        if inserted == 0 {
            return Err(Error::AlreadyExists(format!(
                "Connection already exists: {} --[{}]--> {}",
                start, kind, end
            )));
        }

        Ok(CycleConnection {
            id: self.conn.last_insert_rowid(),
            start,
            end,
            kind,
        })
    }

    /// Insert the default cycle wiring, skipping connections already present.
    /// Returns the number of connections inserted.
    pub fn seed_default_connections(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for (start, end, kind) in default_connections() {
            inserted += tx.execute(
                "INSERT OR IGNORE INTO cycle_connects (start_stage, end_stage, kind) VALUES (?1, ?2, ?3)",
                params![start, end, kind.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// List all connections in insertion order.
    ///
    /// Rows with an unrecognised type tag are logged and left out.
    pub fn list_connections(&self) -> Result<Vec<CycleConnection>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_stage, end_stage, kind FROM cycle_connects ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let connections = rows
            .into_iter()
            .filter_map(|(id, start, end, kind)| match kind.parse::<ConnectionKind>() {
                Ok(kind) => Some(CycleConnection {
                    id,
                    start,
                    end,
                    kind,
                }),
                Err(e) => {
                    tracing::warn!(id, %start, %end, "skipping connection: {}", e);
                    None
                }
            })
            .collect();
        Ok(connections)
    }

    // === Maintenance ===

    /// Row counts per table.
    pub fn counts(&self) -> Result<StorageCounts> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StorageCounts {
            stages: count("lifecycle")?,
            substages: count("substages")?,
            tools: count("tools")?,
            connections: count("cycle_connects")?,
        })
    }
}

/// Remove all substages and tools, keeping stages and connections.
pub(crate) fn clear_taxonomy(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM tools;
        DELETE FROM substages;
        "#,
    )?;
    Ok(())
}

/// Insert a stage named by an import row unless it already exists.
/// Returns true if a new stage was created.
pub(crate) fn ensure_stage(conn: &Connection, name: &str) -> Result<bool> {
    let name = normalize_stage_name(name);
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lifecycle WHERE stage = ?1)",
        [&name],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(false);
    }

    let position = match stage_position(&name) {
        Some(p) => p,
        None => conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM lifecycle",
            [],
            |row| row.get(0),
        )?,
    };
    let description = stage_definition(&name).unwrap_or_default();

    conn.execute(
        "INSERT INTO lifecycle (stage, stagedesc, position) VALUES (?1, ?2, ?3)",
        params![name, description, position],
    )?;
    Ok(true)
}

pub(crate) fn insert_substage(
    conn: &Connection,
    name: &str,
    description: &str,
    exemplar: &str,
    stage: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO substages (substagename, substagedesc, exemplar, stage) VALUES (?1, ?2, ?3, ?4)",
        params![name, description, exemplar, stage],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_tool(
    conn: &Connection,
    name: &str,
    description: &str,
    link: &str,
    provider: &str,
    stage: &str,
    now: DateTime<Utc>,
) -> Result<i64> {
    let now = now.to_rfc3339();
    conn.execute(
        "INSERT INTO tools (name, description, link, provider, stage, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![name, description, link, provider, stage, now],
    )?;
    Ok(conn.last_insert_rowid())
}

fn stage_from_row(row: &Row<'_>) -> rusqlite::Result<Stage> {
    Ok(Stage {
        name: row.get(0)?,
        description: row.get(1)?,
        position: row.get(2)?,
    })
}

fn substage_from_row(row: &Row<'_>) -> rusqlite::Result<SubStage> {
    Ok(SubStage {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        exemplar: row.get(3)?,
        stage: row.get(4)?,
    })
}

fn tool_from_row(row: &Row<'_>) -> rusqlite::Result<Tool> {
    Ok(Tool {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        link: row.get(3)?,
        provider: row.get(4)?,
        stage: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
        updated_at: parse_timestamp(row, 7)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
