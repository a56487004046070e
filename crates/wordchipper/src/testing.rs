//! # Tokenizer Test Utilities
//!
//! Shared fixtures for exercising [`TokenizerStage`] implementations, so
//! downstream users of this crate can write their own tests against the
//! same standard sequences and assertions this crate tests itself with,
//! without re-deriving them. Enabled for this crate's own tests
//! unconditionally, and for downstream users via the `testing` feature.

use crate::bpe::{BpeOptions, BpeTokenizer};
use crate::errors::WCResult;
use crate::lz::{LzCoder, LzOptions};
use crate::stage::TokenizerStage;
use crate::types::Symbol;

/// A repeating sequence over `{1..=4}`, long enough for every tokenizer
/// kind in this crate to see realistic repetition.
///
/// ## Returns
/// A `Vec<S>` of length 200.
pub fn common_test_sequence<S: Symbol>() -> Vec<S> {
    (0..200)
        .map(|i| S::from_i32(1 + (i * 7 % 4)).expect("small positive ints fit any Symbol type"))
        .collect()
}

/// Build a [`BpeTokenizer`] trained on [`common_test_sequence`].
pub fn common_bpe_tokenizer<S: Symbol>() -> WCResult<BpeTokenizer<S>> {
    let mut bpe = BpeOptions::new().with_max_output_vocab(16).init::<S>()?;
    bpe.learn(&common_test_sequence::<S>(), None)?;
    Ok(bpe)
}

/// Build an [`LzCoder`] trained on [`common_test_sequence`].
pub fn common_lz_coder<S: Symbol>() -> WCResult<LzCoder<S>> {
    let mut lz = LzOptions::<S>::new(64).init()?;
    lz.learn(&common_test_sequence::<S>(), None)?;
    Ok(lz)
}

/// Assert the universal round-trip law for any [`TokenizerStage`]: after
/// training `stage` on `tokens`, `stage.decode(stage.encode(tokens)) ==
/// tokens`, and every emitted id lies in `stage.output_vocab()`.
///
/// ## Arguments
/// * `stage` - The tokenizer stage to train and exercise.
/// * `tokens` - The training/round-trip sequence.
pub fn assert_stage_round_trips<S: Symbol, T: TokenizerStage<S>>(
    stage: &mut T,
    tokens: &[S],
) -> WCResult<()> {
    stage.learn(tokens, None)?;
    let encoded = stage.encode(tokens)?;
    let output_vocab = stage.output_vocab();
    for id in &encoded {
        assert!(
            output_vocab.contains(id),
            "encoded id {id} not in stage output_vocab"
        );
    }
    let decoded = stage.decode(&encoded)?;
    assert_eq!(decoded, tokens, "decode(encode(tokens)) != tokens");
    Ok(())
}
