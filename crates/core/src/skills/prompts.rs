//! Default prompt templates bundled at compile time.
//!
//! Templates carry `{placeholder}` markers that each skill substitutes with
//! fields from the pipeline context before calling the adapter.

/// Analyst - decomposes the raw idea into task, inputs, outputs, integrations
pub const ANALYST: &str = include_str!("defaults/analyst.md");

/// Architect - names the agent and writes its system prompt and stack
pub const ARCHITECT: &str = include_str!("defaults/architect.md");

/// Visualizer - renders the workflow as a Mermaid diagram
pub const VISUALIZER: &str = include_str!("defaults/visualizer.md");

/// Planner - rollout plan, project metrics, and risk classification
pub const PLANNER: &str = include_str!("defaults/planner.md");

/// Clarify - pre-pipeline gate asking follow-up questions when needed
pub const CLARIFY: &str = include_str!("defaults/clarify.md");

/// Copilot - answers follow-up questions about a finished blueprint
pub const COPILOT: &str = include_str!("defaults/copilot.md");

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("analyst", ANALYST),
        ("architect", ARCHITECT),
        ("visualizer", VISUALIZER),
        ("planner", PLANNER),
        ("clarify", CLARIFY),
        ("copilot", COPILOT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_prompts_non_empty() {
        for (slug, content) in all_defaults() {
            assert!(!content.is_empty(), "Prompt '{}' should not be empty", slug);
            assert!(content.len() > 50, "Prompt '{}' seems too short", slug);
        }
    }

    #[test]
    fn test_prompts_demand_json() {
        for (slug, content) in all_defaults() {
            assert!(content.contains("JSON"), "Prompt '{}' should ask for JSON", slug);
        }
    }
}
