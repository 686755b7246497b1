//! # Planner Skill
//!
//! Final stage: a stepwise rollout plan, contextual project metrics, and a
//! risk classification. The fallback is an empty plan at normal risk.
//!
//! `risk_status` stays a plain string here and is parsed into
//! [`RiskStatus`](crate::models::RiskStatus) at assembly time, so an
//! inventive label from the model degrades instead of failing the parse.

use serde::{Deserialize, Serialize};

use crate::llm::{CallAdapter, InvokeError, Invoked};
use crate::models::{ImplementationStep, ProjectMetrics};
use crate::pipeline::PipelineContext;
use crate::skills::prompts;

/// Output of the planner stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerOutput {
    #[serde(default)]
    pub implementation_plan: Vec<ImplementationStep>,
    #[serde(default)]
    pub project_metrics: ProjectMetrics,
    /// "normal" | "warning" | "high"; anything else reads as normal
    #[serde(default)]
    pub risk_status: String,
}

pub struct PlannerSkill;

impl PlannerSkill {
    /// Empty plan at normal risk, substituted when all attempts fail
    pub fn fallback() -> PlannerOutput {
        PlannerOutput::default()
    }

    pub async fn run(
        ctx: &PipelineContext,
        adapter: &CallAdapter,
    ) -> Result<Invoked<PlannerOutput>, InvokeError> {
        let prompt = prompts::PLANNER.replace("{task}", ctx.task());
        adapter
            .invoke_with_fallback(&prompt, Some(Self::fallback()))
            .await
    }
}
