//! # Tokenizer Stage Capability Set
//!
//! Polymorphism across tokenizer variants (BPE, LZ, Hierarchical LZ,
//! contextual encoder) is modeled as a capability set —
//! `{learn, encode, decode, input_vocab, output_vocab}` — rather than an
//! inheritance hierarchy. [`Pipeline`](crate::pipeline::Pipeline) dispatches
//! across stages dynamically via `Box<dyn TokenizerStage<S>>`; individual
//! tokenizer types remain concrete and usable standalone without virtual
//! calls.

use std::collections::HashSet;

use crate::errors::WCResult;
use crate::types::Symbol;

/// The common capability set every tokenizer in this crate exposes.
pub trait TokenizerStage<S: Symbol>: Send + Sync {
    /// Train the stage from scratch on `tokens`.
    ///
    /// ## Arguments
    /// * `tokens` - The training sequence.
    /// * `input_vocab` - An optional explicit input vocabulary.
    fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()>;

    /// Encode `tokens` under the current model.
    ///
    /// ## Arguments
    /// * `tokens` - The sequence to encode.
    fn encode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>>;

    /// Decode `tokens` under the current model.
    ///
    /// ## Arguments
    /// * `tokens` - The ids to decode.
    fn decode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>>;

    /// The stage's input vocabulary.
    fn input_vocab(&self) -> HashSet<S>;

    /// The stage's output vocabulary.
    fn output_vocab(&self) -> HashSet<S>;
}
