//! # Generation Orchestrator
//!
//! Owns one session from handle minting to terminal record. `start`
//! schedules the run off the calling path and returns the handle
//! immediately; observation happens through the progress registry, never
//! through a join handle. There is no caller-initiated cancellation: once
//! started, a session runs to a terminal record even if nobody is
//! watching, and the registry entry is reclaimed after a grace window.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::llm::CallAdapter;
use crate::models::DialogMessage;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::progress::{ProgressRecord, ProgressStore, SessionId};
use crate::pipeline::stage::GenerationStage;
use crate::skills::{AnalystSkill, ArchitectSkill, PlannerSkill, VisualizerSkill};

/// Configuration for the generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// How long a terminal record stays readable before eviction, so late
    /// pollers still get one last read
    pub grace_window: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            grace_window: Duration::from_secs(300),
        }
    }
}

/// The pipeline orchestrator
#[derive(Clone)]
pub struct Generator {
    adapter: CallAdapter,
    store: Arc<dyn ProgressStore>,
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(adapter: CallAdapter, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            adapter,
            store,
            config: GeneratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Start a generation session and return its handle immediately.
    ///
    /// The step-0 record is readable before this returns; everything else
    /// happens in a spawned task.
    pub async fn start(
        &self,
        idea: impl Into<String>,
        attachments: Vec<String>,
        dialog: Vec<DialogMessage>,
    ) -> SessionId {
        let session = SessionId::new();
        let ctx = PipelineContext::new(idea, attachments, dialog);

        self.store.put(session, ProgressRecord::initializing()).await;
        tracing::info!(
            %session,
            idea_preview = %ctx.idea.chars().take(80).collect::<String>(),
            "generation session started"
        );

        let generator = self.clone();
        tokio::spawn(async move { generator.run(session, ctx).await });
        session
    }

    /// Drive one session to its terminal record, then schedule eviction.
    async fn run(self, session: SessionId, mut ctx: PipelineContext) {
        match self.execute(session, &mut ctx).await {
            Ok(()) => tracing::info!(%session, "generation session completed"),
            Err(err) => {
                tracing::error!(%session, error = %err, "generation session failed");
                let step = self
                    .store
                    .get(session)
                    .await
                    .map(|record| record.step)
                    .unwrap_or(0);
                self.store
                    .put(session, ProgressRecord::failed(&format!("{err:#}"), step))
                    .await;
            }
        }

        let store = self.store.clone();
        let grace = self.config.grace_window;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            store.evict(session).await;
            tracing::debug!(%session, "session entry evicted");
        });
    }

    /// The 4-step chain. Strictly sequential: each stage reads what the
    /// previous ones accumulated in the context.
    #[tracing::instrument(skip_all, fields(session = %session))]
    async fn execute(&self, session: SessionId, ctx: &mut PipelineContext) -> anyhow::Result<()> {
        let mut degraded = false;
        let mut stage = GenerationStage::Analyzing;

        self.store
            .put(session, ProgressRecord::at_stage(stage, degraded))
            .await;
        let analysis = AnalystSkill::run(ctx, &self.adapter)
            .await
            .context("Analyst stage failed")?;
        degraded |= analysis.degraded;
        ctx.analysis = Some(analysis.value);

        stage.advance();
        self.store
            .put(session, ProgressRecord::at_stage(stage, degraded))
            .await;
        let design = ArchitectSkill::run(ctx, &self.adapter)
            .await
            .context("Architect stage failed")?;
        degraded |= design.degraded;
        ctx.design = Some(design.value);

        stage.advance();
        self.store
            .put(session, ProgressRecord::at_stage(stage, degraded))
            .await;
        let diagram = VisualizerSkill::run(ctx, &self.adapter)
            .await
            .context("Visualizer stage failed")?;
        degraded |= diagram.degraded;
        ctx.diagram = Some(diagram.value);

        stage.advance();
        self.store
            .put(session, ProgressRecord::at_stage(stage, degraded))
            .await;
        let plan = PlannerSkill::run(ctx, &self.adapter)
            .await
            .context("Planner stage failed")?;
        degraded |= plan.degraded;
        ctx.plan = Some(plan.value);

        let blueprint = ctx.assemble();
        self.store
            .put(session, ProgressRecord::completed(blueprint, degraded))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::test_support::ScriptedTransport;
    use crate::llm::{CompletionTransport, RetryPolicy, TransportError};
    use crate::pipeline::progress::InMemoryProgressStore;
    use async_trait::async_trait;

    const ANALYST_JSON: &str = r#"{
        "task": "Track expenses via messenger",
        "inputs": ["chat messages"],
        "outputs": ["expense report"],
        "integrations": ["Telegram"]
    }"#;
    const ARCHITECT_JSON: &str = r#"{
        "name": "PennyBot",
        "role": "Expense tracker",
        "avatar": "💰",
        "system_prompt": "You are PennyBot, a meticulous expense tracker.",
        "tech_stack": ["Telegram Bot API", "PostgreSQL"]
    }"#;
    const VISUALIZER_JSON: &str =
        r#"{"mermaid_code": "graph LR; A[\"Message\"] --> B[\"PennyBot\"];"}"#;
    const PLANNER_JSON: &str = r#"{
        "implementation_plan": [{"day": 1, "task": "Set up the bot", "duration": "2h"}],
        "project_metrics": {
            "project_type": "technical",
            "key_metrics": [{"label": "Setup cost", "value": "100", "unit": "$"}],
            "resources_needed": [{"category": "Accounts", "items": ["Telegram bot token"]}]
        },
        "risk_status": "normal"
    }"#;

    /// Scripted transport that takes measurable time per reply, so a test
    /// can observe the session mid-flight.
    struct SlowTransport {
        inner: ScriptedTransport,
        delay: Duration,
    }

    #[async_trait]
    impl CompletionTransport for SlowTransport {
        async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
            tokio::time::sleep(self.delay).await;
            self.inner.complete(prompt).await
        }
    }

    fn happy_script() -> Vec<Result<String, TransportError>> {
        vec![
            Ok(ANALYST_JSON.to_string()),
            Ok(ARCHITECT_JSON.to_string()),
            Ok(VISUALIZER_JSON.to_string()),
            Ok(PLANNER_JSON.to_string()),
        ]
    }

    fn adapter_for(transport: Arc<dyn CompletionTransport>) -> CallAdapter {
        CallAdapter::new(transport).with_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
        })
    }

    async fn await_terminal(
        store: &Arc<InMemoryProgressStore>,
        session: SessionId,
    ) -> ProgressRecord {
        loop {
            if let Some(record) = store.get(session).await {
                if record.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_happy_path() {
        let store = Arc::new(InMemoryProgressStore::new());
        let transport = Arc::new(ScriptedTransport::new(happy_script()));
        let generator = Generator::new(adapter_for(transport), store.clone());

        let session = generator
            .start("track expenses via messenger", vec![], vec![])
            .await;
        let record = await_terminal(&store, session).await;

        assert!(record.completed);
        assert!(!record.error);
        assert!(!record.degraded);
        assert_eq!(record.step, 4);

        let blueprint = record.result.expect("completed record carries the blueprint");
        assert_eq!(blueprint.agent_profile.name, "PennyBot");
        assert!(!blueprint.tech_stack.is_empty());
        assert!(!blueprint.implementation_plan.is_empty());
        assert!(blueprint.mermaid_code.contains("graph LR"));
        assert_eq!(blueprint.description, "Track expenses via messenger");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_returns_while_pipeline_is_still_running() {
        let store = Arc::new(InMemoryProgressStore::new());
        let transport = Arc::new(SlowTransport {
            inner: ScriptedTransport::new(happy_script()),
            delay: Duration::from_millis(200),
        });
        let generator = Generator::new(adapter_for(transport), store.clone());

        let session = generator.start("idea", vec![], vec![]).await;

        // The handle is live before the first upstream call has answered.
        let record = store.get(session).await.expect("record readable at once");
        assert!(!record.is_terminal());
        assert!(record.step <= 1);

        let record = await_terminal(&store, session).await;
        assert!(record.completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stage_writes_terminal_error_without_result() {
        let store = Arc::new(InMemoryProgressStore::new());
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::Transient("down".into())),
            Err(TransportError::Transient("down".into())),
            Err(TransportError::Transient("down".into())),
        ]));
        let generator = Generator::new(adapter_for(transport), store.clone());

        let session = generator.start("idea", vec![], vec![]).await;
        let record = await_terminal(&store, session).await;

        assert!(record.error);
        assert!(!record.completed);
        assert!(record.result.is_none());
        assert!(record.stage.contains("Analyst"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_stage_with_fallback_degrades_instead_of_failing() {
        let store = Arc::new(InMemoryProgressStore::new());
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(ANALYST_JSON.to_string()),
            // Architect exhausts all three attempts...
            Err(TransportError::Transient("down".into())),
            Err(TransportError::Transient("down".into())),
            Err(TransportError::Transient("down".into())),
            // ...and the rest of the chain recovers.
            Ok(VISUALIZER_JSON.to_string()),
            Ok(PLANNER_JSON.to_string()),
        ]));
        let generator = Generator::new(adapter_for(transport), store.clone());

        let session = generator.start("idea", vec![], vec![]).await;
        let record = await_terminal(&store, session).await;

        assert!(record.completed);
        assert!(record.degraded);
        let blueprint = record.result.unwrap();
        assert_eq!(blueprint.agent_profile.name, "AI Assistant");
        assert!(blueprint.mermaid_code.contains("PennyBot"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sessions_do_not_perturb_each_other() {
        let store = Arc::new(InMemoryProgressStore::new());
        let fast = Generator::new(
            adapter_for(Arc::new(ScriptedTransport::new(happy_script()))),
            store.clone(),
        );
        let failing = Generator::new(
            adapter_for(Arc::new(ScriptedTransport::new(vec![
                Err(TransportError::Transient("down".into())),
                Err(TransportError::Transient("down".into())),
                Err(TransportError::Transient("down".into())),
            ]))),
            store.clone(),
        );

        let good = fast.start("idea one", vec![], vec![]).await;
        let bad = failing.start("idea two", vec![], vec![]).await;
        assert_ne!(good, bad);

        let good_record = await_terminal(&store, good).await;
        let bad_record = await_terminal(&store, bad).await;

        assert!(good_record.completed && !good_record.error);
        assert!(bad_record.error && !bad_record.completed);
        assert_eq!(good_record.step, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_is_evicted_after_grace_window() {
        let store = Arc::new(InMemoryProgressStore::new());
        let transport = Arc::new(ScriptedTransport::new(happy_script()));
        let generator = Generator::new(adapter_for(transport), store.clone())
            .with_config(GeneratorConfig {
                grace_window: Duration::from_secs(30),
            });

        let session = generator.start("idea", vec![], vec![]).await;
        await_terminal(&store, session).await;

        // Still readable inside the grace window...
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(store.get(session).await.is_some());

        // ...gone after it.
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(store.get(session).await.is_none());
    }
}
