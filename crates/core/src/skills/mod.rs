//! # Blueprint Skills
//!
//! The generative stages behind the pipeline. Each skill is a pure mapping
//! from the accumulated [`PipelineContext`](crate::pipeline::PipelineContext)
//! to its own typed output: render a prompt from context fields, call the
//! adapter, and accept the reply through a permissive `#[serde(default)]`
//! shape so a missing key never fails a stage.
//!
//! ## Skill categories
//!
//! **Chain skills** (the ordered 4-step pipeline):
//! - `AnalystSkill` - decompose the idea into task / inputs / outputs / integrations
//! - `ArchitectSkill` - name the agent, write its system prompt and stack
//! - `VisualizerSkill` - draw the workflow as a Mermaid diagram
//! - `PlannerSkill` - rollout plan, project metrics, risk classification
//!
//! **Gate skill** (runs before the chain, advisory only):
//! - `ClarifySkill` - decide whether follow-up questions are needed
//!
//! **Sibling skill** (one-shot, outside the chain):
//! - `CopilotSkill` - answer follow-up questions about a finished blueprint

pub mod prompts;

// Chain skills
pub mod analyst_skill;
pub mod architect_skill;
pub mod planner_skill;
pub mod visualizer_skill;

// Gate
pub mod clarify_skill;

// Sibling one-shot
pub mod copilot_skill;

// Re-exports for convenience
pub use analyst_skill::{AnalystOutput, AnalystSkill};
pub use architect_skill::{ArchitectOutput, ArchitectSkill};
pub use clarify_skill::{ClarifyOutput, ClarifySkill};
pub use copilot_skill::{CopilotOutput, CopilotSkill};
pub use planner_skill::{PlannerOutput, PlannerSkill};
pub use visualizer_skill::{VisualizerOutput, VisualizerSkill};
