//! # Session Progress Registry
//!
//! Concurrent handle -> record map decoupling pipeline execution from
//! progress observation. The generator task writes, each emitter task
//! reads; records are replaced wholesale so a reader never observes a torn
//! one. A terminal record freezes the entry until eviction.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::AgentBlueprint;
use crate::pipeline::stage::{GenerationStage, TOTAL_STEPS};

/// Opaque handle of one generation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Latest observable state of a session, replaced wholesale on each update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Human-readable stage label (carries the message on failure)
    pub stage: String,
    pub step: u32,
    pub total: u32,
    pub completed: bool,
    pub error: bool,
    /// True when any stage so far substituted its fallback fragment
    #[serde(default)]
    pub degraded: bool,
    /// The assembled blueprint, present only on the completed record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AgentBlueprint>,
}

impl ProgressRecord {
    /// Step-0 record written before the first stage starts
    pub fn initializing() -> Self {
        Self {
            stage: "Initializing...".to_string(),
            step: 0,
            total: TOTAL_STEPS,
            completed: false,
            error: false,
            degraded: false,
            result: None,
        }
    }

    /// Record naming the stage about to run
    pub fn at_stage(stage: GenerationStage, degraded: bool) -> Self {
        Self {
            stage: stage.label().to_string(),
            step: stage.step(),
            total: TOTAL_STEPS,
            completed: false,
            error: false,
            degraded,
            result: None,
        }
    }

    /// Terminal success record carrying the blueprint
    pub fn completed(blueprint: AgentBlueprint, degraded: bool) -> Self {
        Self {
            stage: GenerationStage::Complete.label().to_string(),
            step: TOTAL_STEPS,
            total: TOTAL_STEPS,
            completed: true,
            error: false,
            degraded,
            result: Some(blueprint),
        }
    }

    /// Terminal failure record; no partial blueprint is ever attached
    pub fn failed(message: &str, step: u32) -> Self {
        Self {
            stage: format!("Generation failed: {message}"),
            step,
            total: TOTAL_STEPS,
            completed: false,
            error: true,
            degraded: false,
            result: None,
        }
    }

    /// Synthetic record the emitter sends when its budget runs out.
    /// Never stored in the registry.
    pub fn timed_out() -> Self {
        Self {
            stage: "timeout".to_string(),
            step: 0,
            total: TOTAL_STEPS,
            completed: false,
            error: true,
            degraded: false,
            result: None,
        }
    }

    /// Terminal records never transition again
    pub fn is_terminal(&self) -> bool {
        self.completed || self.error
    }
}

/// Concurrent session-progress registry.
///
/// Injected behind this trait so the in-memory map can be swapped for a
/// distributed cache or a test double without touching the generator.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Total overwrite of the session's record. A no-op once the stored
    /// record is terminal.
    async fn put(&self, session: SessionId, record: ProgressRecord);
    async fn get(&self, session: SessionId) -> Option<ProgressRecord>;
    async fn evict(&self, session: SessionId);
}

/// Registry backed by a sharded concurrent map.
///
/// Handles are unique per run, so there is never write-write contention on
/// one key; the map only has to make read/write races safe.
#[derive(Default)]
pub struct InMemoryProgressStore {
    sessions: DashMap<SessionId, ProgressRecord>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (not yet evicted) sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn put(&self, session: SessionId, record: ProgressRecord) {
        match self.sessions.entry(session) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_terminal() {
                    tracing::debug!(%session, "ignoring write after terminal record");
                    return;
                }
                entry.insert(record);
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
        }
    }

    async fn get(&self, session: SessionId) -> Option<ProgressRecord> {
        self.sessions.get(&session).map(|record| record.clone())
    }

    async fn evict(&self, session: SessionId) {
        self.sessions.remove(&session);
    }
}
