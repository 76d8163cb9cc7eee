//! # Guichet Core
//!
//! Shared foundation of the Guichet FAQ engine: domain types, capability
//! traits, the error taxonomy and the configuration system.
//!
//! ## Design
//! - **Capabilities, not implementations** — embedding and generation models
//!   are injected behind [`TextEmbedder`] / [`AnswerBackend`]; this crate
//!   never talks to the network.
//! - **Parsed data in, results out** — the core consumes already-parsed
//!   [`KnowledgeEntry`] / [`ReferenceItem`] sequences; file formats belong to
//!   the binary layer.
//! - **Failures are data** — backend trouble becomes an [`AnswerResult`]
//!   with an [`ErrorKind`] tag, so the benchmark always has a record to
//!   score.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::GuichetConfig;
pub use error::{ErrorKind, GuichetError, Result};
pub use traits::{AnswerBackend, Extraction, GenerateOptions, Generation, Strategy, TextEmbedder};
pub use types::{
    AnswerResult, Difficulty, KnowledgeEntry, QuestionType, ReferenceItem, RetrievalHit,
    StrategyKind, clamp_unit,
};
