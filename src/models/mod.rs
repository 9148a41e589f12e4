//! Data models for the research data lifecycle taxonomy.
//!
//! This module defines the core data structures:
//! - `Stage` - One phase of the twelve-step lifecycle
//! - `SubStage` - A category of tool types within a stage, with exemplars
//! - `Tool` - A software product associated with a stage
//! - `CycleConnection` - A directed edge between two stages

pub mod graph;
pub mod layout;
pub mod taxonomy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lifecycle stage. The stage name doubles as its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Uppercase stage identifier (e.g., "COLLECT")
    pub name: String,

    /// Definition shown as the node tooltip
    pub description: String,

    /// 1-based position in the cycle
    pub position: i64,
}

impl Stage {
    /// Create a new stage, normalizing the identifier to uppercase.
    pub fn new(name: impl AsRef<str>, description: impl Into<String>, position: i64) -> Self {
        Self {
            name: normalize_stage_name(name.as_ref()),
            description: description.into(),
            position,
        }
    }
}

/// Normalize a stage identifier: trimmed and uppercased.
pub fn normalize_stage_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// A named sub-category of tool types within a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubStage {
    pub id: i64,
    pub name: String,
    pub description: String,

    /// Raw comma-separated exemplar list as it appears in the source sheet
    pub exemplar: String,

    /// Owning stage identifier
    pub stage: String,
}

impl SubStage {
    /// Split the exemplar list into trimmed, non-empty entries.
    pub fn exemplars(&self) -> Vec<String> {
        split_exemplars(&self.exemplar)
    }
}

/// Split a comma-separated exemplar list into trimmed, non-empty entries.
pub fn split_exemplars(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A software product associated with a lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub id: i64,
    pub name: String,
    pub description: String,

    /// Homepage or documentation URL (may be empty)
    pub link: String,

    /// Vendor or maintaining organisation (may be empty)
    pub provider: String,

    /// Owning stage identifier
    pub stage: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub provider: String,
    pub stage: String,
}

impl NewTool {
    /// Create a new tool input with just a name and stage.
    pub fn new(name: impl Into<String>, stage: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            stage: normalize_stage_name(stage.as_ref()),
            ..Default::default()
        }
    }

    /// Check field-level constraints. Stage existence is checked by storage.
    pub fn validate(&self) -> Result<(), String> {
        validate_tool_name(&self.name)?;
        validate_tool_link(&self.link)?;
        if self.stage.trim().is_empty() {
            return Err("Tool stage must not be empty".to_string());
        }
        Ok(())
    }
}

/// Partial update for a tool. Only fields that are `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ToolUpdate {
    /// Returns true if no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.link.is_none()
            && self.provider.is_none()
            && self.stage.is_none()
    }

    /// Check field-level constraints on the supplied fields.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref name) = self.name {
            validate_tool_name(name)?;
        }
        if let Some(ref link) = self.link {
            validate_tool_link(link)?;
        }
        if let Some(ref stage) = self.stage {
            if stage.trim().is_empty() {
                return Err("Tool stage must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Overwrite the supplied fields on `tool`.
    pub fn apply(&self, tool: &mut Tool) {
        if let Some(ref name) = self.name {
            tool.name = name.trim().to_string();
        }
        if let Some(ref description) = self.description {
            tool.description = description.clone();
        }
        if let Some(ref link) = self.link {
            tool.link = link.trim().to_string();
        }
        if let Some(ref provider) = self.provider {
            tool.provider = provider.clone();
        }
        if let Some(ref stage) = self.stage {
            tool.stage = normalize_stage_name(stage);
        }
    }
}

fn validate_tool_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Tool name must not be empty".to_string());
    }
    Ok(())
}

fn validate_tool_link(link: &str) -> Result<(), String> {
    let link = link.trim();
    if !link.is_empty() && !link.starts_with("http://") && !link.starts_with("https://") {
        return Err(format!(
            "Tool link must start with http:// or https://, got: {}",
            link
        ));
    }
    Ok(())
}

/// Type tag of a cycle connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Part of the main cycle
    #[default]
    Normal,
    /// A shortcut or variant path
    Alternative,
}

impl ConnectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Normal => "normal",
            ConnectionKind::Alternative => "alternative",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(ConnectionKind::Normal),
            "alternative" => Ok(ConnectionKind::Alternative),
            _ => Err(format!("Unknown connection type: {}", s)),
        }
    }
}

/// A directed edge between two lifecycle stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConnection {
    pub id: i64,

    /// Start stage identifier
    pub start: String,

    /// End stage identifier
    pub end: String,

    pub kind: ConnectionKind,
}

impl CycleConnection {
    pub fn new(id: i64, start: impl AsRef<str>, end: impl AsRef<str>, kind: ConnectionKind) -> Self {
        Self {
            id,
            start: normalize_stage_name(start.as_ref()),
            end: normalize_stage_name(end.as_ref()),
            kind,
        }
    }
}
