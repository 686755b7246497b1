//! # Visualizer Skill
//!
//! Third stage: renders the agent's workflow as Mermaid.js source. The
//! fallback is a bare input -> agent -> output diagram; a blueprint without
//! a pretty picture is still a blueprint.

use serde::{Deserialize, Serialize};

use crate::llm::{CallAdapter, InvokeError, Invoked};
use crate::pipeline::PipelineContext;
use crate::skills::prompts;

/// Output of the visualizer stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizerOutput {
    #[serde(default)]
    pub mermaid_code: String,
}

pub struct VisualizerSkill;

impl VisualizerSkill {
    /// Minimal valid diagram substituted when all attempts fail
    pub fn fallback() -> VisualizerOutput {
        VisualizerOutput {
            mermaid_code: "graph LR; A[\"Input\"] --> B[\"Agent\"] --> C[\"Output\"];"
                .to_string(),
        }
    }

    pub async fn run(
        ctx: &PipelineContext,
        adapter: &CallAdapter,
    ) -> Result<Invoked<VisualizerOutput>, InvokeError> {
        let prompt = prompts::VISUALIZER
            .replace("{task}", ctx.task())
            .replace("{inputs}", &ctx.inputs().join(", "))
            .replace("{outputs}", &ctx.outputs().join(", "));
        adapter
            .invoke_with_fallback(&prompt, Some(Self::fallback()))
            .await
    }
}
