//! # Copilot Skill
//!
//! Sibling one-shot stage outside the pipeline: answers follow-up questions
//! about a blueprint that was already produced. One adapter invocation, no
//! fallback - a failed reply propagates to the caller as a hard error.
//!
//! The skill is stateless: the caller supplies the history window and is
//! responsible for appending the new turn afterwards.

use serde::{Deserialize, Serialize};

use crate::llm::{CallAdapter, InvokeError};
use crate::models::{render_transcript, AgentBlueprint, DialogMessage};
use crate::skills::prompts;

/// Most recent turns of history embedded into the prompt
pub const HISTORY_WINDOW: usize = 8;

/// Reply of the copilot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopilotOutput {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

pub struct CopilotSkill;

impl CopilotSkill {
    pub async fn reply(
        message: &str,
        blueprint: &AgentBlueprint,
        history: &[DialogMessage],
        current_step: Option<u32>,
        adapter: &CallAdapter,
    ) -> Result<CopilotOutput, InvokeError> {
        let window = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
        let step = current_step
            .map(|s| s.to_string())
            .unwrap_or_else(|| "not started".to_string());

        let prompt = prompts::COPILOT
            .replace("{agent_name}", &blueprint.agent_profile.name)
            .replace("{agent_role}", &blueprint.agent_profile.role)
            .replace("{description}", &blueprint.description)
            .replace("{tech_stack}", &blueprint.tech_stack.join(", "))
            .replace("{current_step}", &step)
            .replace("{history}", &render_transcript(window))
            .replace("{message}", message);

        adapter.invoke(&prompt).await
    }
}
