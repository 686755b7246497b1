//! # Progress Emitter
//!
//! Turns registry state into a lazy per-connection sequence of progress
//! events. The emitter polls; it never blocks the generator and the
//! generator never knows it exists. Giving up on a stream does not stop
//! the underlying run.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::progress::{ProgressRecord, ProgressStore, SessionId};

/// Pacing and patience of one progress stream
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// How often the registry is polled
    pub poll_interval: Duration,
    /// Wall-clock budget after which the stream gives up with a synthetic
    /// timeout event
    pub stream_budget: Duration,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            stream_budget: Duration::from_secs(600),
        }
    }
}

/// Per-connection reader over one session's progress.
///
/// Emits a record when the step index changes, immediately for terminal
/// records, and exactly one synthetic timeout record when the budget runs
/// out. An unknown or already-evicted handle yields nothing until then -
/// deliberately indistinguishable from a slow session.
pub struct ProgressEmitter {
    store: Arc<dyn ProgressStore>,
    session: SessionId,
    config: EmitterConfig,
    last_step: Option<u32>,
    deadline: Instant,
    finished: bool,
}

impl ProgressEmitter {
    pub fn new(store: Arc<dyn ProgressStore>, session: SessionId, config: EmitterConfig) -> Self {
        let deadline = Instant::now() + config.stream_budget;
        Self {
            store,
            session,
            config,
            last_step: None,
            deadline,
            finished: false,
        }
    }

    /// Next event for this stream, or `None` once it has ended.
    pub async fn next_event(&mut self) -> Option<ProgressRecord> {
        if self.finished {
            return None;
        }
        loop {
            if let Some(record) = self.store.get(self.session).await {
                if record.is_terminal() {
                    self.finished = true;
                    return Some(record);
                }
                if self.last_step != Some(record.step) {
                    self.last_step = Some(record.step);
                    return Some(record);
                }
            }
            if Instant::now() >= self.deadline {
                tracing::debug!(session = %self.session, "progress stream budget exhausted");
                self.finished = true;
                return Some(ProgressRecord::timed_out());
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentBlueprint, AgentProfile, ProjectMetrics, RiskStatus};
    use crate::pipeline::progress::InMemoryProgressStore;
    use crate::pipeline::stage::GenerationStage;

    fn blueprint() -> AgentBlueprint {
        AgentBlueprint {
            agent_profile: AgentProfile::default(),
            description: "d".to_string(),
            mermaid_code: String::new(),
            system_prompt: String::new(),
            tech_stack: vec![],
            implementation_plan: vec![],
            project_metrics: ProjectMetrics::default(),
            risk_status: RiskStatus::Normal,
        }
    }

    fn fast_config() -> EmitterConfig {
        EmitterConfig {
            poll_interval: Duration::from_millis(10),
            stream_budget: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_on_step_change_and_terminal() {
        let store = Arc::new(InMemoryProgressStore::new());
        let session = SessionId::new();
        store.put(session, ProgressRecord::initializing()).await;

        let mut emitter = ProgressEmitter::new(store.clone(), session, fast_config());
        assert_eq!(emitter.next_event().await.unwrap().step, 0);

        // A writer advancing the session while the emitter polls.
        let writer_store = store.clone();
        tokio::spawn(async move {
            writer_store
                .put(session, ProgressRecord::at_stage(GenerationStage::Analyzing, false))
                .await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            writer_store
                .put(session, ProgressRecord::completed(blueprint(), false))
                .await;
        });

        let next = emitter.next_event().await.unwrap();
        assert_eq!(next.step, 1);

        let terminal = emitter.next_event().await.unwrap();
        assert!(terminal.completed);
        assert!(terminal.result.is_some());

        assert!(emitter.next_event().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_step_is_not_re_emitted() {
        let store = Arc::new(InMemoryProgressStore::new());
        let session = SessionId::new();
        store
            .put(session, ProgressRecord::at_stage(GenerationStage::Analyzing, false))
            .await;

        let mut emitter = ProgressEmitter::new(store.clone(), session, fast_config());
        assert_eq!(emitter.next_event().await.unwrap().step, 1);

        let writer_store = store.clone();
        tokio::spawn(async move {
            // Same step written again, then a real advance.
            writer_store
                .put(session, ProgressRecord::at_stage(GenerationStage::Analyzing, false))
                .await;
            tokio::time::sleep(Duration::from_millis(30)).await;
            writer_store
                .put(session, ProgressRecord::at_stage(GenerationStage::Architecting, false))
                .await;
        });

        let next = emitter.next_event().await.unwrap();
        assert_eq!(next.step, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_session_times_out_with_synthetic_event() {
        let store = Arc::new(InMemoryProgressStore::new());
        let mut emitter = ProgressEmitter::new(store, SessionId::new(), fast_config());

        let event = emitter.next_event().await.unwrap();
        assert!(event.error);
        assert_eq!(event.stage, "timeout");
        assert!(emitter.next_event().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_open_still_gets_exactly_the_terminal_event() {
        let store = Arc::new(InMemoryProgressStore::new());
        let session = SessionId::new();
        store
            .put(session, ProgressRecord::completed(blueprint(), true))
            .await;

        let mut emitter = ProgressEmitter::new(store, session, fast_config());
        let event = emitter.next_event().await.unwrap();
        assert!(event.completed);
        assert!(event.degraded);
        assert!(emitter.next_event().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observed_steps_are_non_decreasing() {
        let store = Arc::new(InMemoryProgressStore::new());
        let session = SessionId::new();
        store.put(session, ProgressRecord::initializing()).await;

        let writer_store = store.clone();
        tokio::spawn(async move {
            let mut stage = GenerationStage::Analyzing;
            loop {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if stage.is_terminal() {
                    writer_store
                        .put(session, ProgressRecord::completed(blueprint(), false))
                        .await;
                    break;
                }
                writer_store
                    .put(session, ProgressRecord::at_stage(stage, false))
                    .await;
                stage.advance();
            }
        });

        let mut emitter = ProgressEmitter::new(store, session, fast_config());
        let mut last = 0;
        while let Some(record) = emitter.next_event().await {
            assert!(record.step >= last);
            last = record.step;
        }
        assert_eq!(last, 4);
    }
}
