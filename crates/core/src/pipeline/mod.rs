//! # Generation Pipeline
//!
//! Drives the skill chain for one session and makes its progress
//! observable to a second, independent request lifecycle.
//!
//! - `stage` - the ordered stage state machine
//! - `context` - per-run accumulator and blueprint assembly
//! - `progress` - session handles, progress records, and the registry
//! - `emitter` - polling reader that turns registry updates into a stream
//! - `generator` - the orchestrator: start a session, run it to a terminal
//!   record off the calling path

pub mod context;
pub mod emitter;
pub mod generator;
pub mod progress;
pub mod stage;

pub use context::PipelineContext;
pub use emitter::{EmitterConfig, ProgressEmitter};
pub use generator::{Generator, GeneratorConfig};
pub use progress::{InMemoryProgressStore, ProgressRecord, ProgressStore, SessionId};
pub use stage::{GenerationStage, TOTAL_STEPS};
