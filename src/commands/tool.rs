//! Tool CRUD commands.

use super::{Output, open_storage, to_json};
use crate::models::{NewTool, Tool, ToolUpdate};
use crate::{Error, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
pub struct ToolList {
    pub tools: Vec<Tool>,
    pub count: usize,
}

impl Output for ToolList {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if self.tools.is_empty() {
            return "No tools found.".to_string();
        }
        let mut lines = vec![format!("{} tool(s):", self.count)];
        for tool in &self.tools {
            let link = if tool.link.is_empty() {
                String::new()
            } else {
                format!(" <{}>", tool.link)
            };
            lines.push(format!("  [{}] {} ({}){}", tool.id, tool.name, tool.stage, link));
        }
        lines.join("\n")
    }
}

/// List tools, optionally only those of one stage.
pub fn tool_list(db: &Path, stage: Option<&str>) -> Result<ToolList> {
    let storage = open_storage(db)?;
    if let Some(stage) = stage {
        storage.get_stage(stage)?;
    }
    let tools = storage.list_tools(stage)?;
    Ok(ToolList {
        count: tools.len(),
        tools,
    })
}

#[derive(Serialize)]
pub struct ToolResult {
    #[serde(flatten)]
    pub tool: Tool,
}

impl Output for ToolResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let t = &self.tool;
        let mut lines = vec![format!("[{}] {}", t.id, t.name)];
        lines.push(format!("  Stage: {}", t.stage));
        if !t.description.is_empty() {
            lines.push(format!("  Description: {}", t.description));
        }
        if !t.link.is_empty() {
            lines.push(format!("  Link: {}", t.link));
        }
        if !t.provider.is_empty() {
            lines.push(format!("  Provider: {}", t.provider));
        }
        lines.push(format!(
            "  Updated: {}",
            t.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.join("\n")
    }
}

pub fn tool_add(db: &Path, tool: NewTool) -> Result<ToolResult> {
    let mut storage = open_storage(db)?;
    let tool = storage.create_tool(&tool)?;
    Ok(ToolResult { tool })
}

pub fn tool_show(db: &Path, id: i64) -> Result<ToolResult> {
    let storage = open_storage(db)?;
    Ok(ToolResult {
        tool: storage.get_tool(id)?,
    })
}

pub fn tool_update(db: &Path, id: i64, update: ToolUpdate) -> Result<ToolResult> {
    if update.is_empty() {
        return Err(Error::InvalidInput("No fields to update".to_string()));
    }
    let mut storage = open_storage(db)?;
    let tool = storage.update_tool(id, &update)?;
    Ok(ToolResult { tool })
}

#[derive(Serialize)]
pub struct ToolDeleted {
    pub id: i64,
    pub deleted: bool,
}

impl Output for ToolDeleted {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted tool {}", self.id)
    }
}

pub fn tool_delete(db: &Path, id: i64) -> Result<ToolDeleted> {
    let mut storage = open_storage(db)?;
    storage.delete_tool(id)?;
    Ok(ToolDeleted { id, deleted: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    fn setup() -> TestEnv {
        let env = TestEnv::new();
        env.init_storage();
        env
    }

    #[test]
    fn test_tool_add_then_list() {
        let env = setup();
        let mut input = NewTool::new("Zenodo", "publish");
        input.link = "https://zenodo.org".to_string();
        input.provider = "CERN".to_string();

        let added = tool_add(&env.db_path(), input).unwrap();
        assert_eq!(added.tool.stage, "PUBLISH");

        let all = tool_list(&env.db_path(), None).unwrap();
        assert_eq!(all.count, 1);
        assert_eq!(all.tools[0].name, "Zenodo");

        let publish = tool_list(&env.db_path(), Some("PUBLISH")).unwrap();
        assert_eq!(publish.count, 1);
        let plan = tool_list(&env.db_path(), Some("PLAN")).unwrap();
        assert_eq!(plan.count, 0);
        assert_eq!(plan.to_human(), "No tools found.");
    }

    #[test]
    fn test_tool_add_unknown_stage() {
        let env = setup();
        let result = tool_add(&env.db_path(), NewTool::new("Zenodo", "DISCOVER"));
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(tool_list(&env.db_path(), None).unwrap().count, 0);
    }

    #[test]
    fn test_tool_add_rejects_bad_link() {
        let env = setup();
        let mut input = NewTool::new("Zenodo", "PUBLISH");
        input.link = "zenodo.org".to_string();
        assert!(matches!(
            tool_add(&env.db_path(), input),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tool_update_reflected_in_show() {
        let env = setup();
        let id = tool_add(&env.db_path(), NewTool::new("Dryad", "PUBLISH"))
            .unwrap()
            .tool
            .id;

        let update = ToolUpdate {
            stage: Some("preserve".to_string()),
            description: Some("Curated repository".to_string()),
            ..Default::default()
        };
        tool_update(&env.db_path(), id, update).unwrap();

        let shown = tool_show(&env.db_path(), id).unwrap();
        assert_eq!(shown.tool.stage, "PRESERVE");
        assert_eq!(shown.tool.description, "Curated repository");
        assert_eq!(shown.tool.name, "Dryad");
        assert!(shown.to_human().contains("Stage: PRESERVE"));
    }

    #[test]
    fn test_tool_update_requires_fields() {
        let env = setup();
        let id = tool_add(&env.db_path(), NewTool::new("Dryad", "PUBLISH"))
            .unwrap()
            .tool
            .id;
        assert!(matches!(
            tool_update(&env.db_path(), id, ToolUpdate::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tool_delete() {
        let env = setup();
        let id = tool_add(&env.db_path(), NewTool::new("Dryad", "PUBLISH"))
            .unwrap()
            .tool
            .id;

        let deleted = tool_delete(&env.db_path(), id).unwrap();
        assert!(deleted.deleted);
        assert!(matches!(
            tool_show(&env.db_path(), id),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            tool_delete(&env.db_path(), id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_tool_result_json_is_flat() {
        let env = setup();
        let added = tool_add(&env.db_path(), NewTool::new("Dryad", "PUBLISH")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&added.to_json()).unwrap();
        assert_eq!(json["name"], "Dryad");
        assert_eq!(json["stage"], "PUBLISH");
        assert!(json["id"].is_i64());
    }
}
