//! # Blueprint Core
//!
//! The "Brain" of the Blueprint system - turns a free-text product idea into
//! a structured agent blueprint by driving a fixed chain of generative stages
//! against an external text-generation service.
//!
//! ## Architecture
//!
//! - `llm/` - Call adapter for the generation service (retries, backoff, fallbacks)
//! - `skills/` - Generative stages (AnalystSkill, ArchitectSkill, VisualizerSkill, ...)
//! - `pipeline/` - Generation orchestration, session progress registry and emitter
//! - `models` - The blueprint artifact and its field-level defaults
//! - `services` - Contracts for external collaborators (quota, persistence)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blueprint_core::pipeline::{Generator, InMemoryProgressStore, ProgressEmitter};
//!
//! let generator = Generator::new(adapter, store.clone());
//! let session = generator.start("Track expenses via messenger", vec![], vec![]).await;
//! let mut emitter = ProgressEmitter::new(store, session, Default::default());
//! while let Some(record) = emitter.next_event().await {
//!     println!("{} ({}/{})", record.stage, record.step, record.total);
//! }
//! ```

pub mod llm;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod skills;
