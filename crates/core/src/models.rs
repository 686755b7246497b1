//! # Blueprint Models
//!
//! The agent blueprint artifact and the data that flows through the
//! generation pipeline. Every field a client can read is defined here,
//! together with the default it falls back to when the generation service
//! leaves it out - the degradation policy lives in one place instead of
//! being repeated at each consumption site.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Profile card of the generated agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Creative agent name (default: "AI Assistant")
    pub name: String,
    /// Short role label (default: "Assistant")
    pub role: String,
    /// Single emoji avatar (default: "🤖")
    pub avatar: String,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: "AI Assistant".to_string(),
            role: "Assistant".to_string(),
            avatar: "🤖".to_string(),
        }
    }
}

/// One step of the implementation plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationStep {
    /// Day offset within the rollout (default: 0)
    #[serde(default)]
    pub day: u32,
    /// What gets done that day (default: "Not specified")
    #[serde(default = "unspecified")]
    pub task: String,
    /// Estimated effort, free text (default: "Not specified")
    #[serde(default = "unspecified")]
    pub duration: String,
}

fn unspecified() -> String {
    "Not specified".to_string()
}

/// A single labelled metric, e.g. estimated cost or hours saved
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyMetric {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub unit: String,
}

/// A category of resources the project needs (tools, parts, people)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceGroup {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Contextual metrics for the project behind the idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    /// Rough classification of the idea (default: "other")
    #[serde(default = "other_project_type")]
    pub project_type: String,
    #[serde(default)]
    pub key_metrics: Vec<KeyMetric>,
    #[serde(default)]
    pub resources_needed: Vec<ResourceGroup>,
}

impl Default for ProjectMetrics {
    fn default() -> Self {
        Self {
            project_type: other_project_type(),
            key_metrics: Vec::new(),
            resources_needed: Vec::new(),
        }
    }
}

fn other_project_type() -> String {
    "other".to_string()
}

/// Risk classification assigned by the planner stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    #[default]
    Normal,
    Warning,
    High,
}

impl FromStr for RiskStatus {
    type Err = std::convert::Infallible;

    /// Unknown labels degrade to `Normal` rather than failing the pipeline.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "warning" => RiskStatus::Warning,
            "high" => RiskStatus::High,
            _ => RiskStatus::Normal,
        })
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskStatus::Normal => "normal",
            RiskStatus::Warning => "warning",
            RiskStatus::High => "high",
        };
        f.write_str(label)
    }
}

/// The assembled artifact of a full generation run.
///
/// Produced once, at pipeline completion; immutable thereafter. Ownership
/// transfers to the persistence collaborator when the caller elects to save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBlueprint {
    pub agent_profile: AgentProfile,
    /// One-sentence description of what the agent automates
    pub description: String,
    /// Mermaid.js source for the workflow diagram
    pub mermaid_code: String,
    /// Full system prompt for running the agent
    pub system_prompt: String,
    pub tech_stack: Vec<String>,
    pub implementation_plan: Vec<ImplementationStep>,
    pub project_metrics: ProjectMetrics,
    pub risk_status: RiskStatus,
}

/// Role of a message in a prior dialog or copilot conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogRole {
    User,
    Assistant,
}

impl fmt::Display for DialogRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DialogRole::User => "user",
            DialogRole::Assistant => "assistant",
        })
    }
}

/// One turn of conversation scoped to an idea or a saved blueprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogMessage {
    pub role: DialogRole,
    pub content: String,
}

impl DialogMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: DialogRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: DialogRole::Assistant,
            content: content.into(),
        }
    }
}

/// Render a bounded dialog window as plain text for prompt embedding
pub fn render_transcript(messages: &[DialogMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
