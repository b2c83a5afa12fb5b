//! ToolRegistry - the closed menu of tools and their execution

use std::collections::BTreeMap;
use tracing::debug;

use crate::llm::{ToolCall, ToolDefinition};

use super::builtin::{
    ApplyPatchTool, ListFilesTool, ProjectMapTool, ReadFileTool, RunCommandTool, SearchCodeTool, WriteFileTool,
};
use super::{Tool, ToolContext, ToolResult};

/// Tool profiles define which tools each agent role may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolProfile {
    /// Full access: the editor's toolset
    #[default]
    Editor,
    /// read_file and project_map only
    Analyzer,
    /// Read-only exploration: read, list, search, map
    Query,
    /// read_file and run_command (build/test verification)
    Reviewer,
}

/// Closed registry mapping tool names to implementations
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a registry for a tool profile
    pub fn with_profile(profile: ToolProfile) -> Self {
        debug!(?profile, "ToolRegistry::with_profile: called");
        let mut registry = Self { tools: BTreeMap::new() };

        match profile {
            ToolProfile::Editor => {
                registry.add(Box::new(ReadFileTool));
                registry.add(Box::new(ListFilesTool));
                registry.add(Box::new(SearchCodeTool));
                registry.add(Box::new(ProjectMapTool));
                registry.add(Box::new(WriteFileTool));
                registry.add(Box::new(ApplyPatchTool));
                registry.add(Box::new(RunCommandTool));
            }
            ToolProfile::Analyzer => {
                registry.add(Box::new(ReadFileTool));
                registry.add(Box::new(ProjectMapTool));
            }
            ToolProfile::Query => {
                registry.add(Box::new(ReadFileTool));
                registry.add(Box::new(ListFilesTool));
                registry.add(Box::new(SearchCodeTool));
                registry.add(Box::new(ProjectMapTool));
            }
            ToolProfile::Reviewer => {
                registry.add(Box::new(ReadFileTool));
                registry.add(Box::new(RunCommandTool));
            }
        }

        registry
    }

    /// Add a tool
    pub fn add(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Tool definitions advertised to the LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.parameters()))
            .collect()
    }

    /// Execute one tool call
    ///
    /// Arguments are parsed here, lazily: a malformed argument string
    /// becomes a tool-result error fed back to the model, not a crash.
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> ToolResult {
        debug!(tool = %call.name, id = %call.id, "ToolRegistry::execute: called");
        let Some(tool) = self.tools.get(call.name.as_str()) else {
            return ToolResult::error(format!("Unknown tool: {}", call.name));
        };

        let input = match call.parse_arguments() {
            Ok(v) => v,
            Err(e) => return ToolResult::error(format!("Invalid tool arguments: {}", e)),
        };

        tool.execute(input, ctx).await
    }

    /// Whether a named tool mutates the workspace
    pub fn is_write_tool(&self, name: &str) -> bool {
        self.tools.get(name).map(|t| t.is_write()).unwrap_or(false)
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of all registered tools
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_profile(ToolProfile::Editor)
    }
}
