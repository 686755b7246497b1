//! # Call Adapter
//!
//! The invocation contract every stage goes through. One `invoke` is one
//! logical request: up to `max_attempts` tries against the transport,
//! linear backoff after transient failures, an immediate re-ask when the
//! model returns something unparseable, and - once the budget is spent -
//! either the stage's fallback fragment or an `Exhausted` error carrying
//! the last cause.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::transport::{CompletionTransport, TransportError};

/// Attempt budget and pacing for one logical invocation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Backoff unit; attempt `i` (0-based) waits `(i + 1) * base_delay`
    /// before the next try
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows attempt `attempt` (0-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }
}

/// Why an invocation failed
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Network failure, timeout, or rate limiting on a single attempt
    #[error("transient upstream failure: {0}")]
    Upstream(String),
    /// The model answered, but not with the expected JSON shape
    #[error("model response was not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Every attempt was spent and no fallback was configured
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<InvokeError>,
    },
    /// A failure retrying cannot fix; remaining attempts are not consumed
    #[error("upstream request failed: {0}")]
    Fatal(String),
}

/// A successful invocation, flagged when the value came from the fallback
#[derive(Debug, Clone, PartialEq)]
pub struct Invoked<T> {
    pub value: T,
    /// True when the attempt budget was exhausted and the fallback
    /// fragment was substituted
    pub degraded: bool,
}

/// Retrying front door to the generation service
#[derive(Clone)]
pub struct CallAdapter {
    transport: Arc<dyn CompletionTransport>,
    policy: RetryPolicy,
}

impl CallAdapter {
    pub fn new(transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Invoke without a fallback: exhaustion surfaces as an error.
    pub async fn invoke<T>(&self, prompt: &str) -> Result<T, InvokeError>
    where
        T: DeserializeOwned,
    {
        self.invoke_with_fallback(prompt, None)
            .await
            .map(|invoked| invoked.value)
    }

    /// Invoke with an optional fallback fragment.
    ///
    /// The fallback is substituted only after every attempt is spent; the
    /// result is then flagged `degraded`. A fatal transport error aborts
    /// immediately and is never papered over by the fallback.
    pub async fn invoke_with_fallback<T>(
        &self,
        prompt: &str,
        fallback: Option<T>,
    ) -> Result<Invoked<T>, InvokeError>
    where
        T: DeserializeOwned,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<InvokeError> = None;

        for attempt in 0..max_attempts {
            tracing::debug!(attempt = attempt + 1, max_attempts, "calling generation service");

            match self.transport.complete(prompt).await {
                Ok(raw) => match serde_json::from_str::<T>(&raw) {
                    Ok(value) => {
                        return Ok(Invoked {
                            value,
                            degraded: false,
                        });
                    }
                    Err(err) => {
                        // Unparseable output gets an immediate re-ask; the
                        // service is up, the sample was just bad.
                        tracing::warn!(
                            attempt = attempt + 1,
                            error = %err,
                            "unparseable model response, retrying"
                        );
                        last_error = Some(InvokeError::Malformed(err));
                    }
                },
                Err(TransportError::Transient(reason)) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        reason = %reason,
                        "transient upstream failure"
                    );
                    last_error = Some(InvokeError::Upstream(reason));
                    if attempt + 1 < max_attempts {
                        let delay = self.policy.delay_after(attempt);
                        tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off");
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(TransportError::Fatal(reason)) => {
                    tracing::error!(attempt = attempt + 1, reason = %reason, "fatal upstream failure");
                    return Err(InvokeError::Fatal(reason));
                }
            }
        }

        match fallback {
            Some(value) => {
                tracing::warn!(attempts = max_attempts, "attempts exhausted, using fallback");
                Ok(Invoked {
                    value,
                    degraded: true,
                })
            }
            None => Err(InvokeError::Exhausted {
                attempts: max_attempts,
                last: Box::new(
                    last_error.unwrap_or_else(|| InvokeError::Upstream("no attempts made".into())),
                ),
            }),
        }
    }
}
