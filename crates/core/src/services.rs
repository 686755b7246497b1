//! # Collaborator Contracts
//!
//! Identity, quota accounting, and blueprint storage live outside this
//! crate. The pipeline consumes them only through the traits below: an
//! opaque caller token, a may-this-caller-start-a-job decision, and a sink
//! that takes ownership of a finished blueprint. The bundled
//! implementations are the permissive in-process defaults the server boots
//! with; real deployments inject their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::models::AgentBlueprint;

/// Opaque caller identity. The pipeline never inspects it - it is minted
/// and interpreted by the excluded identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerToken(String);

impl CallerToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Token used when a request carries no identity at all
    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// "May this caller start a job" decision, consulted before every start
#[async_trait]
pub trait QuotaService: Send + Sync {
    async fn can_start(&self, caller: &CallerToken) -> bool;
}

/// Default quota decision: everyone may generate
pub struct AllowAll;

#[async_trait]
impl QuotaService for AllowAll {
    async fn can_start(&self, _caller: &CallerToken) -> bool {
        true
    }
}

/// Receipt for a persisted blueprint
#[derive(Debug, Clone, Serialize)]
pub struct SavedBlueprint {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence sink for completed blueprints. Invoked only when the caller
/// elects to keep the artifact; ownership transfers here.
#[async_trait]
pub trait BlueprintSink: Send + Sync {
    async fn persist(
        &self,
        caller: &CallerToken,
        idea: &str,
        blueprint: &AgentBlueprint,
    ) -> anyhow::Result<SavedBlueprint>;
}

#[derive(Clone)]
struct StoredBlueprint {
    caller: CallerToken,
    #[allow(dead_code)]
    idea: String,
    blueprint: AgentBlueprint,
    created_at: DateTime<Utc>,
}

/// Process-local sink; loses everything on restart. Stands in for the
/// external storage collaborator in development and tests.
#[derive(Default)]
pub struct InMemorySink {
    saved: DashMap<Uuid, StoredBlueprint>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// Receipts for everything one caller has saved
    pub fn saved_for(&self, caller: &CallerToken) -> Vec<SavedBlueprint> {
        self.saved
            .iter()
            .filter(|entry| &entry.value().caller == caller)
            .map(|entry| SavedBlueprint {
                id: *entry.key(),
                name: entry.value().blueprint.agent_profile.name.clone(),
                created_at: entry.value().created_at,
            })
            .collect()
    }
}

#[async_trait]
impl BlueprintSink for InMemorySink {
    async fn persist(
        &self,
        caller: &CallerToken,
        idea: &str,
        blueprint: &AgentBlueprint,
    ) -> anyhow::Result<SavedBlueprint> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        self.saved.insert(
            id,
            StoredBlueprint {
                caller: caller.clone(),
                idea: idea.to_string(),
                blueprint: blueprint.clone(),
                created_at,
            },
        );
        Ok(SavedBlueprint {
            id,
            name: blueprint.agent_profile.name.clone(),
            created_at,
        })
    }
}
