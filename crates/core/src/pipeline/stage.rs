//! # Pipeline Stages
//!
//! The ordered stages of one generation run.

use serde::{Deserialize, Serialize};

/// Number of billable steps in the chain (the clarify gate is not one)
pub const TOTAL_STEPS: u32 = 4;

/// Stage of the generation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    /// Analyst decomposing the business task
    Analyzing,
    /// Architect designing the agent
    Architecting,
    /// Visualizer drawing the workflow
    Visualizing,
    /// Planner calculating the rollout and metrics
    Planning,
    /// Complete
    Complete,
    /// Failed
    Failed,
}

impl GenerationStage {
    /// Advance to the next stage
    pub fn advance(&mut self) {
        *self = match self {
            GenerationStage::Analyzing => GenerationStage::Architecting,
            GenerationStage::Architecting => GenerationStage::Visualizing,
            GenerationStage::Visualizing => GenerationStage::Planning,
            GenerationStage::Planning => GenerationStage::Complete,
            GenerationStage::Complete => GenerationStage::Complete,
            GenerationStage::Failed => GenerationStage::Failed,
        };
    }

    /// 1-based step index reported to pollers
    pub fn step(&self) -> u32 {
        match self {
            GenerationStage::Analyzing => 1,
            GenerationStage::Architecting => 2,
            GenerationStage::Visualizing => 3,
            GenerationStage::Planning => 4,
            GenerationStage::Complete | GenerationStage::Failed => TOTAL_STEPS,
        }
    }

    /// Human-readable progress label
    pub fn label(&self) -> &'static str {
        match self {
            GenerationStage::Analyzing => "Decomposing the business task...",
            GenerationStage::Architecting => "Designing the agent architecture...",
            GenerationStage::Visualizing => "Drawing the workflow diagram...",
            GenerationStage::Planning => "Calculating the plan and metrics...",
            GenerationStage::Complete => "Complete",
            GenerationStage::Failed => "Failed",
        }
    }

    /// Check if the stage is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStage::Complete | GenerationStage::Failed)
    }
}
