//! # LLM Call Layer
//!
//! Everything that talks to the external text-generation service.
//!
//! The layer is split along a trait seam:
//!
//! - [`CompletionTransport`] performs exactly one completion request and
//!   classifies failures as transient or fatal. The production
//!   implementation is [`HttpCompletionTransport`]; tests inject scripted
//!   doubles.
//! - [`CallAdapter`] wraps a transport with the invocation contract the
//!   pipeline relies on: bounded attempts, linear backoff for transient
//!   failures, immediate re-ask for unparseable output, and fallback
//!   substitution once the attempt budget is spent.

pub mod adapter;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapter::{CallAdapter, InvokeError, Invoked, RetryPolicy};
pub use transport::{CompletionTransport, HttpCompletionTransport, TransportConfig, TransportError};
