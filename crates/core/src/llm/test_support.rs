//! Scripted transport double shared by adapter, skill, and pipeline tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::transport::{CompletionTransport, TransportError};

/// Replays a fixed sequence of outcomes, one per `complete` call.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String, TransportError>>>,
    calls: AtomicU32,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<String, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of `complete` calls observed so far
    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(&self, _prompt: &str) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Fatal("script exhausted".to_string())))
    }
}
