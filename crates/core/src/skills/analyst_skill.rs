//! # Analyst Skill
//!
//! First stage of the chain: decomposes the raw idea into the task the
//! agent automates, the data it consumes and produces, and the services it
//! integrates with. Everything downstream reads this output, so the stage
//! carries no fallback - if it cannot be produced, the session fails.

use serde::{Deserialize, Serialize};

use crate::llm::{CallAdapter, InvokeError, Invoked};
use crate::pipeline::PipelineContext;
use crate::skills::prompts;

/// Output of the analyst stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalystOutput {
    /// The agent's primary task, one sentence
    #[serde(default)]
    pub task: String,
    /// What the agent receives
    #[serde(default)]
    pub inputs: Vec<String>,
    /// What the agent produces
    #[serde(default)]
    pub outputs: Vec<String>,
    /// External services the agent talks to
    #[serde(default)]
    pub integrations: Vec<String>,
}

pub struct AnalystSkill;

impl AnalystSkill {
    pub async fn run(
        ctx: &PipelineContext,
        adapter: &CallAdapter,
    ) -> Result<Invoked<AnalystOutput>, InvokeError> {
        let prompt = prompts::ANALYST
            .replace("{idea}", &ctx.idea)
            .replace("{context}", &ctx.supplementary_context());
        adapter.invoke_with_fallback(&prompt, None).await
    }
}
