//! # Clarify Skill
//!
//! Pre-pipeline gate, not part of the 4-step chain. Looks at the raw idea
//! (plus any prior dialog) and decides whether the author should answer
//! follow-up questions before generation starts. The verdict is advisory:
//! the caller may ignore it and start a job anyway.
//!
//! Failure here must never block generation, so the skill degrades to a
//! pass-through verdict instead of raising.

use serde::{Deserialize, Serialize};

use crate::llm::{CallAdapter, InvokeError, Invoked};
use crate::models::{render_transcript, DialogMessage};
use crate::skills::prompts;

/// Maximum number of follow-up questions surfaced to the caller
pub const MAX_QUESTIONS: usize = 3;

/// Verdict of the clarify gate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClarifyOutput {
    #[serde(default)]
    pub needs_clarification: bool,
    #[serde(default)]
    pub questions: Vec<String>,
    /// Restatement of the idea folding in any dialog answers
    #[serde(default)]
    pub summary: String,
}

pub struct ClarifySkill;

impl ClarifySkill {
    /// Pass-through verdict substituted when all attempts fail
    pub fn fallback(idea: &str) -> ClarifyOutput {
        ClarifyOutput {
            needs_clarification: false,
            questions: Vec::new(),
            summary: idea.to_string(),
        }
    }

    pub async fn run(
        idea: &str,
        dialog: &[DialogMessage],
        adapter: &CallAdapter,
    ) -> Result<Invoked<ClarifyOutput>, InvokeError> {
        let prompt = prompts::CLARIFY
            .replace("{idea}", idea)
            .replace("{context}", &render_transcript(dialog));
        let mut invoked: Invoked<ClarifyOutput> = adapter
            .invoke_with_fallback(&prompt, Some(Self::fallback(idea)))
            .await?;
        invoked.value.questions.truncate(MAX_QUESTIONS);
        if invoked.value.summary.is_empty() {
            invoked.value.summary = idea.to_string();
        }
        Ok(invoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::test_support::ScriptedTransport;
    use crate::llm::{RetryPolicy, TransportError};
    use std::sync::Arc;
    use std::time::Duration;

    fn adapter(transport: Arc<ScriptedTransport>) -> CallAdapter {
        CallAdapter::new(transport).with_policy(RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn test_question_list_is_capped() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(r#"{
            "needs_clarification": true,
            "questions": ["a?", "b?", "c?", "d?", "e?"],
            "summary": "s"
        }"#
        .into())]));
        let invoked = ClarifySkill::run("idea", &[], &adapter(transport))
            .await
            .unwrap();
        assert!(invoked.value.needs_clarification);
        assert_eq!(invoked.value.questions.len(), MAX_QUESTIONS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_outage_degrades_to_pass_through() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::Transient("down".into())),
            Err(TransportError::Transient("down".into())),
        ]));
        let invoked = ClarifySkill::run("build a bot", &[], &adapter(transport))
            .await
            .unwrap();
        assert!(invoked.degraded);
        assert!(!invoked.value.needs_clarification);
        assert_eq!(invoked.value.summary, "build a bot");
    }
}
