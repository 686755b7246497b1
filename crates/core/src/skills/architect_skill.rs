//! # Architect Skill
//!
//! Second stage: names the agent, writes its system prompt, and picks a
//! tech stack. Falls back to a generic assistant profile when the service
//! stays unreachable, so one flaky stage does not sink the whole session.

use serde::{Deserialize, Serialize};

use crate::llm::{CallAdapter, InvokeError, Invoked};
use crate::pipeline::PipelineContext;
use crate::skills::prompts;

/// Output of the architect stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchitectOutput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

pub struct ArchitectSkill;

impl ArchitectSkill {
    /// Degraded-but-usable profile substituted when all attempts fail
    pub fn fallback() -> ArchitectOutput {
        ArchitectOutput {
            name: "AI Assistant".to_string(),
            role: "Assistant".to_string(),
            avatar: "🤖".to_string(),
            system_prompt: String::new(),
            tech_stack: Vec::new(),
        }
    }

    pub async fn run(
        ctx: &PipelineContext,
        adapter: &CallAdapter,
    ) -> Result<Invoked<ArchitectOutput>, InvokeError> {
        let prompt = prompts::ARCHITECT
            .replace("{task}", ctx.task())
            .replace("{integrations}", &ctx.integrations().join(", "));
        adapter
            .invoke_with_fallback(&prompt, Some(Self::fallback()))
            .await
    }
}
