//! Stage, substage, exemplar and graph commands.

use super::{Output, open_storage, to_json};
use crate::models::graph::{LifecycleGraph, project};
use crate::models::{Stage, SubStage, Tool};
use crate::storage::Storage;
use crate::Result;
use serde::Serialize;
use std::path::Path;

// === Stages ===

#[derive(Serialize)]
pub struct StageList {
    pub stages: Vec<Stage>,
}

impl Output for StageList {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if self.stages.is_empty() {
            return "No stages.".to_string();
        }
        self.stages
            .iter()
            .map(|s| format!("{:>2}. {}", s.position, s.name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn stage_list(db: &Path) -> Result<StageList> {
    let storage = open_storage(db)?;
    Ok(StageList {
        stages: storage.list_stages()?,
    })
}

/// A stage with its substages and tools, as shown when a stage is selected.
#[derive(Serialize)]
pub struct StageDetail {
    pub stage: Stage,
    pub substages: Vec<SubStage>,
    pub tools: Vec<Tool>,
}

impl Output for StageDetail {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{} (stage {})", self.stage.name, self.stage.position),
            format!("  {}", self.stage.description),
            String::new(),
            format!("Substages for {}:", self.stage.name),
        ];
        if self.substages.is_empty() {
            lines.push("  (none)".to_string());
        }
        for s in &self.substages {
            lines.push(format!("  [{}] {} - {}", s.id, s.name, s.description));
        }
        lines.push(String::new());
        lines.push(format!("Tools for {}:", self.stage.name));
        if self.tools.is_empty() {
            lines.push("  (none)".to_string());
        }
        for t in &self.tools {
            lines.push(format!("  [{}] {}", t.id, t.name));
        }
        lines.join("\n")
    }
}

pub fn stage_show(db: &Path, name: &str) -> Result<StageDetail> {
    let storage = open_storage(db)?;
    let stage = storage.get_stage(name)?;
    let substages = storage.list_substages(Some(&stage.name))?;
    let tools = storage.list_tools(Some(&stage.name))?;
    Ok(StageDetail {
        stage,
        substages,
        tools,
    })
}

// === Substages ===

#[derive(Serialize)]
pub struct SubStageList {
    pub substages: Vec<SubStage>,
}

impl Output for SubStageList {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if self.substages.is_empty() {
            return "No substages.".to_string();
        }
        self.substages
            .iter()
            .map(|s| format!("[{}] {} ({})", s.id, s.name, s.stage))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn substage_list(db: &Path, stage: Option<&str>) -> Result<SubStageList> {
    let storage = open_storage(db)?;
    if let Some(stage) = stage {
        storage.get_stage(stage)?;
    }
    Ok(SubStageList {
        substages: storage.list_substages(stage)?,
    })
}

#[derive(Serialize)]
pub struct ExemplarList {
    pub substage: String,
    pub stage: String,
    pub exemplars: Vec<String>,
}

impl Output for ExemplarList {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Exemplars for {}:", self.substage)];
        if self.exemplars.is_empty() {
            lines.push("  (none)".to_string());
        }
        lines.extend(self.exemplars.iter().map(|e| format!("  {}", e)));
        lines.join("\n")
    }
}

/// Exemplars of a substage, split from its comma-separated list.
pub fn exemplars(db: &Path, substage_id: i64) -> Result<ExemplarList> {
    let storage = open_storage(db)?;
    let substage = storage.get_substage(substage_id)?;
    Ok(ExemplarList {
        exemplars: substage.exemplars(),
        substage: substage.name,
        stage: substage.stage,
    })
}

// === Graph ===

#[derive(Serialize)]
pub struct GraphResult {
    #[serde(flatten)]
    pub graph: LifecycleGraph,
}

impl Output for GraphResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let g = &self.graph;
        let mut lines = vec![format!(
            "{} stages, {} connections",
            g.nodes.len(),
            g.edges.len()
        )];
        for edge in &g.edges {
            let marker = if edge.highlighted { "*" } else { " " };
            lines.push(format!(
                "{} {} -> {} ({})",
                marker, edge.source, edge.target, edge.kind
            ));
        }
        for skipped in &g.skipped {
            lines.push(format!(
                "! skipped {} -> {} ({}): unknown stage",
                skipped.start, skipped.end, skipped.kind
            ));
        }
        lines.join("\n")
    }
}

/// Project the stored stages and connections into the lifecycle graph.
///
/// Never fails: if the records cannot be read the error is logged and an
/// empty graph is returned.
pub fn load_graph(storage: &Storage, selected: Option<&str>) -> LifecycleGraph {
    let records = storage
        .list_stages()
        .and_then(|stages| Ok((stages, storage.list_connections()?)));

    match records {
        Ok((stages, connections)) => project(&stages, &connections).with_selection(selected),
        Err(e) => {
            tracing::error!(error = %e, "failed to load lifecycle graph");
            LifecycleGraph::empty()
        }
    }
}

/// The lifecycle graph for the database at `db`, optionally highlighting a
/// stage. A missing or unreadable database yields an empty graph.
pub fn graph(db: &Path, selected: Option<&str>) -> GraphResult {
    let graph = match open_storage(db) {
        Ok(storage) => load_graph(&storage, selected),
        Err(e) => {
            tracing::error!(error = %e, "failed to open lifecycle database");
            LifecycleGraph::empty()
        }
    };
    GraphResult { graph }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::models::ConnectionKind;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_stage_list_and_show() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        storage
            .add_substage("Surveys", "Online surveys", "REDCap", "COLLECT")
            .unwrap();
        drop(storage);

        let list = stage_list(&env.db_path()).unwrap();
        assert_eq!(list.stages.len(), 12);
        assert!(list.to_human().starts_with(" 1. CONCEPTUALISE"));

        let detail = stage_show(&env.db_path(), "collect").unwrap();
        assert_eq!(detail.stage.name, "COLLECT");
        assert_eq!(detail.substages.len(), 1);
        assert!(detail.tools.is_empty());
        assert!(detail.to_human().contains("Substages for COLLECT:"));
    }

    #[test]
    fn test_stage_show_unknown() {
        let env = TestEnv::new();
        env.init_storage();
        assert!(matches!(
            stage_show(&env.db_path(), "DISCOVER"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_substage_list_unknown_stage() {
        let env = TestEnv::new();
        env.init_storage();
        assert!(matches!(
            substage_list(&env.db_path(), Some("DISCOVER")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_exemplars_split() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let substage = storage
            .add_substage("Repositories", "", "Zenodo, Dryad , Figshare", "PUBLISH")
            .unwrap();
        drop(storage);

        let result = exemplars(&env.db_path(), substage.id).unwrap();
        assert_eq!(result.exemplars, vec!["Zenodo", "Dryad", "Figshare"]);
        assert_eq!(result.stage, "PUBLISH");
        assert!(result.to_human().starts_with("Exemplars for Repositories:"));
    }

    #[test]
    fn test_graph_with_selection() {
        let env = TestEnv::new();
        env.init_storage();

        let result = graph(&env.db_path(), Some("PLAN"));
        assert_eq!(result.graph.nodes.len(), 12);
        assert_eq!(result.graph.selected(), Some("PLAN"));

        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 12);
        assert!(json.get("skipped").is_none());
    }

    #[test]
    fn test_graph_reports_dangling_connections() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        storage
            .add_connection("TRANSFORM", "DISCOVER", ConnectionKind::Alternative)
            .unwrap();
        drop(storage);

        let result = graph(&env.db_path(), None);
        assert_eq!(result.graph.edges.len(), 15);
        assert_eq!(result.graph.skipped.len(), 1);
        assert!(result.to_human().contains("skipped TRANSFORM -> DISCOVER"));
    }

    #[test]
    fn test_graph_missing_database_is_empty() {
        let env = TestEnv::new();
        let result = graph(&env.db_path(), Some("PLAN"));
        assert!(result.graph.is_empty());
    }

    #[test]
    fn test_graph_malformed_database_is_empty() {
        let env = TestEnv::new();
        std::fs::write(env.db_path(), b"not a database").unwrap();

        let result = graph(&env.db_path(), Some("PLAN"));
        assert!(result.graph.is_empty());
        assert!(result.graph.skipped.is_empty());
        assert_eq!(result.to_human(), "0 stages, 0 connections");
    }

    #[test]
    fn test_load_graph_empty_database() {
        let storage = Storage::in_memory().unwrap();
        assert!(load_graph(&storage, None).is_empty());
    }
}
