//! # Pipeline Context
//!
//! Mutable accumulator owned by exactly one in-flight run. Starts with the
//! caller's idea (plus attachments and any prior dialog) and picks up each
//! stage's validated output; `assemble` folds the lot into the final
//! blueprint, applying the documented field defaults in one place.

use crate::models::{
    render_transcript, AgentBlueprint, AgentProfile, DialogMessage, RiskStatus,
};
use crate::skills::{AnalystOutput, ArchitectOutput, PlannerOutput, VisualizerOutput};

/// Accumulated state of one generation run
#[derive(Debug, Default)]
pub struct PipelineContext {
    pub idea: String,
    pub attachments: Vec<String>,
    pub dialog: Vec<DialogMessage>,
    pub analysis: Option<AnalystOutput>,
    pub design: Option<ArchitectOutput>,
    pub diagram: Option<VisualizerOutput>,
    pub plan: Option<PlannerOutput>,
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl PipelineContext {
    pub fn new(
        idea: impl Into<String>,
        attachments: Vec<String>,
        dialog: Vec<DialogMessage>,
    ) -> Self {
        Self {
            idea: idea.into(),
            attachments,
            dialog,
            ..Self::default()
        }
    }

    /// Attachments and prior dialog rendered for prompt embedding
    pub fn supplementary_context(&self) -> String {
        let mut parts = Vec::new();
        if !self.attachments.is_empty() {
            parts.push(format!("Attachments:\n{}", self.attachments.join("\n")));
        }
        if !self.dialog.is_empty() {
            parts.push(format!("Dialog:\n{}", render_transcript(&self.dialog)));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join("\n\n")
        }
    }

    /// The agent's task as settled by the analyst, or the raw idea
    pub fn task(&self) -> &str {
        self.analysis
            .as_ref()
            .map(|a| a.task.as_str())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.idea)
    }

    pub fn inputs(&self) -> &[String] {
        self.analysis.as_ref().map(|a| a.inputs.as_slice()).unwrap_or(&[])
    }

    pub fn outputs(&self) -> &[String] {
        self.analysis.as_ref().map(|a| a.outputs.as_slice()).unwrap_or(&[])
    }

    pub fn integrations(&self) -> &[String] {
        self.analysis
            .as_ref()
            .map(|a| a.integrations.as_slice())
            .unwrap_or(&[])
    }

    /// Assemble the final blueprint from everything the stages produced.
    ///
    /// Field defaults match the per-stage ones, so a key the model never
    /// emitted reads the same as a key a fallback fragment filled in.
    pub fn assemble(&self) -> AgentBlueprint {
        let design = self.design.clone().unwrap_or_default();
        let plan = self.plan.clone().unwrap_or_default();
        let generic = AgentProfile::default();

        let mut metrics = plan.project_metrics;
        metrics.project_type = non_empty_or(&metrics.project_type, "other");

        AgentBlueprint {
            agent_profile: AgentProfile {
                name: non_empty_or(&design.name, &generic.name),
                role: non_empty_or(&design.role, &generic.role),
                avatar: non_empty_or(&design.avatar, &generic.avatar),
            },
            description: non_empty_or(self.task(), "Automates the described task"),
            mermaid_code: self
                .diagram
                .as_ref()
                .map(|d| d.mermaid_code.clone())
                .unwrap_or_default(),
            system_prompt: design.system_prompt,
            tech_stack: design.tech_stack,
            implementation_plan: plan.implementation_plan,
            project_metrics: metrics,
            risk_status: plan
                .risk_status
                .parse::<RiskStatus>()
                .unwrap_or(RiskStatus::Normal),
        }
    }
}
