//! # wordchipper
//!
//! A library of composable sequence tokenizers that learn reversible
//! mappings between integer token streams.
//!
//! Given a training sequence of integer symbols, each tokenizer in this
//! crate learns a model and exposes three operations — `learn`, `encode`,
//! `decode` — such that `decode(encode(x))` reconstructs `x` exactly.
//! Tokenizers may be chained into a [`pipeline::Pipeline`], where each
//! stage consumes the previous stage's output vocabulary.
//!
//! ## Components
//!
//! - [`bpe`]: byte-pair-encoding learner and codec.
//! - [`lz`]: trie-backed dictionary coder with unused-token allocation.
//! - [`hlz`]: a family of per-context LZ coders cooperating by vote.
//! - [`contextual`]: per-context substring dictionary keyed by a
//!   bigram-like state machine.
//! - [`pipeline`]: sequential composition of the above.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![warn(missing_docs, unused)]

pub mod bpe;
pub mod contextual;
pub mod errors;
pub mod hlz;
pub mod lz;
pub mod pipeline;
pub mod primitives;
pub mod stage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trie;
pub mod types;

pub use bpe::{BpeOptions, BpeTokenizer};
pub use contextual::{ContextualEncoder, ContextualOptions};
pub use errors::{WCResult, WordchipperError};
pub use hlz::{HierarchicalLz, HierarchicalLzOptions};
pub use lz::{LzCoder, LzOptions};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use stage::TokenizerStage;
pub use types::Symbol;

/// The default [`Symbol`] type used by top-level convenience constructors.
pub type DefaultSymbol = i32;
