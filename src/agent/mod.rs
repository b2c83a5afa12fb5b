//! Specialist agents
//!
//! Every agent is the same bounded tool loop with a different system
//! prompt, tool subset, and iteration cap.

mod research;
mod runner;

pub use research::{ResearchProvider, WebResearchProvider};
pub use runner::AgentRunner;

use crate::prompts::embedded;
use crate::tools::ToolProfile;

/// The specialist agent kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    /// Reads the workspace and reports facts; never proposes changes
    Analyzer,
    /// Makes changes with the full toolset
    Editor,
    /// Answers questions read-only
    Query,
    /// Validates a change by reading and running builds/tests
    Reviewer,
    /// Delegates to a research provider
    Research,
}

impl AgentKind {
    /// Lowercase role name (history records, event payloads)
    pub fn role(&self) -> &'static str {
        match self {
            AgentKind::Analyzer => "analyzer",
            AgentKind::Editor => "editor",
            AgentKind::Query => "query",
            AgentKind::Reviewer => "reviewer",
            AgentKind::Research => "research",
        }
    }

    /// System prompt for this agent
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentKind::Analyzer => embedded::ANALYZER,
            AgentKind::Editor => embedded::EDITOR,
            AgentKind::Query => embedded::QUERY,
            AgentKind::Reviewer => embedded::REVIEWER,
            AgentKind::Research => embedded::RESEARCH,
        }
    }

    /// Tool subset this agent may request
    pub fn tool_profile(&self) -> ToolProfile {
        match self {
            AgentKind::Analyzer => ToolProfile::Analyzer,
            AgentKind::Editor => ToolProfile::Editor,
            AgentKind::Query | AgentKind::Research => ToolProfile::Query,
            AgentKind::Reviewer => ToolProfile::Reviewer,
        }
    }

    /// Iteration cap for the tool loop
    pub fn max_iterations(&self) -> u32 {
        match self {
            AgentKind::Analyzer | AgentKind::Reviewer | AgentKind::Research => 3,
            AgentKind::Query => 4,
            AgentKind::Editor => 5,
        }
    }

    /// The text returned when the loop hits its iteration cap
    pub fn cap_sentinel(&self) -> String {
        format!("{} reached max iterations", self.display_name())
    }

    /// Capitalized name for user-facing text
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::Analyzer => "Analyzer",
            AgentKind::Editor => "Editor",
            AgentKind::Query => "Query",
            AgentKind::Reviewer => "Reviewer",
            AgentKind::Research => "Research",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.role())
    }
}
