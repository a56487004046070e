//! # Contextual Encoder
//!
//! Learns, for each `(prev_context, next_context)` pair in the vocabulary,
//! the most frequent substring bridging consecutive occurrences of the two
//! context symbols, then encodes greedily by longest match under the
//! current context's dictionary.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;

use crate::errors::{WCResult, WordchipperError};
use crate::primitives::is_prefix;
use crate::stage::TokenizerStage;
use crate::types::{CommonHashMap, Symbol};

/// Options for constructing a [`ContextualEncoder`].
#[derive(Debug, Clone, Default)]
pub struct ContextualOptions<S: Symbol> {
    input_vocab: Option<Vec<S>>,
}

impl<S: Symbol> ContextualOptions<S> {
    /// Create default options (input vocabulary derived at `learn` time).
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the input vocabulary rather than deriving it from training data.
    ///
    /// ## Arguments
    /// * `input_vocab` - The symbols to treat as the vocabulary.
    pub fn with_input_vocab(
        self,
        input_vocab: &[S],
    ) -> Self {
        Self {
            input_vocab: Some(input_vocab.to_vec()),
        }
    }

    /// Initialize a [`ContextualEncoder`] from these options.
    pub fn init(self) -> WCResult<ContextualEncoder<S>> {
        Ok(ContextualEncoder {
            context_map: CommonHashMap::new(),
            input_vocab: self.input_vocab.map(|v| v.into_iter().collect()).unwrap_or_default(),
        })
    }
}

/// Count, for every `(prev_ctx, next_ctx)` pair, every contiguous substring
/// that starts immediately after an occurrence of `prev_ctx` and ends at an
/// occurrence of `next_ctx` with no intervening `prev_ctx`.
///
/// ## Arguments
/// * `tokens` - The training sequence.
/// * `vocab` - The symbol set to track contexts for.
fn get_context_stats<S: Symbol>(
    tokens: &[S],
    vocab: &BTreeSet<S>,
) -> CommonHashMap<S, CommonHashMap<S, IndexMap<Vec<S>, u64>>> {
    let mut stats: CommonHashMap<S, CommonHashMap<S, IndexMap<Vec<S>, u64>>> = CommonHashMap::new();
    let mut last_idx: CommonHashMap<S, i64> = vocab.iter().map(|&v| (v, -1i64)).collect();

    for (idx, &t) in tokens.iter().enumerate() {
        for &v in vocab.iter() {
            let li = *last_idx.get(&v).unwrap_or(&-1);
            if li >= 0 {
                let sub = tokens[(li as usize + 1)..=idx].to_vec();
                *stats
                    .entry(v)
                    .or_default()
                    .entry(t)
                    .or_default()
                    .entry(sub)
                    .or_insert(0) += 1;
            }
        }
        last_idx.insert(t, idx as i64);
    }

    stats
}

/// Pick the substring with the highest count, breaking ties by first
/// occurrence (insertion order of `counts`).
fn most_frequent_substring<S: Symbol>(counts: &IndexMap<Vec<S>, u64>) -> Option<Vec<S>> {
    let mut best: Option<(&Vec<S>, u64)> = None;
    for (sub, &count) in counts.iter() {
        match best {
            None => best = Some((sub, count)),
            Some((_, best_count)) if count > best_count => best = Some((sub, count)),
            _ => {}
        }
    }
    best.map(|(sub, _)| sub.clone())
}

/// Per-context dictionary tokenizer.
#[derive(Debug, Clone)]
pub struct ContextualEncoder<S: Symbol> {
    context_map: CommonHashMap<S, CommonHashMap<S, Vec<S>>>,
    input_vocab: BTreeSet<S>,
}

impl<S: Symbol> ContextualEncoder<S> {
    /// Train the encoder from scratch on `tokens`.
    ///
    /// ## Arguments
    /// * `tokens` - The training sequence.
    /// * `input_vocab` - An optional explicit vocabulary; defaults to the
    ///   distinct symbols of `tokens`, in ascending order.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, tokens)))]
    pub fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        let vocab: BTreeSet<S> = match input_vocab {
            Some(v) => v.iter().copied().collect(),
            None => tokens.iter().copied().collect(),
        };

        let stats = get_context_stats(tokens, &vocab);
        let zero = S::zero();
        let mut context_map: CommonHashMap<S, CommonHashMap<S, Vec<S>>> = CommonHashMap::new();

        for &v in &vocab {
            context_map.entry(v).or_default().insert(zero, Vec::new());
        }

        for &v in &vocab {
            for &t in &vocab {
                if t == zero {
                    continue;
                }
                if let Some(counts) = stats.get(&v).and_then(|m| m.get(&t)) {
                    if let Some(best) = most_frequent_substring(counts) {
                        context_map.entry(v).or_default().insert(t, best);
                    }
                }
            }
        }

        let mut zero_ctx: CommonHashMap<S, Vec<S>> = CommonHashMap::new();
        for &v in &vocab {
            zero_ctx.insert(v, vec![v]);
        }
        context_map.insert(zero, zero_ctx);

        self.context_map = context_map;
        self.input_vocab = vocab;
        log::info!(
            "Contextual encoder learned {} contexts over {} symbols",
            self.context_map.len(),
            self.input_vocab.len()
        );
        Ok(())
    }

    /// Encode `tokens` greedily: at each step, pick the longest dictionary
    /// entry of the current context that is a prefix of the remaining
    /// input, breaking ties toward the smaller id.
    ///
    /// ## Arguments
    /// * `tokens` - The sequence to encode.
    pub fn encode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        let mut out = Vec::new();
        let mut ctx = S::zero();
        let mut i = 0usize;

        while i < tokens.len() {
            let rem = &tokens[i..];
            let candidates = self
                .context_map
                .get(&ctx)
                .ok_or_else(|| WordchipperError::unknown_context(ctx))?;

            let mut best: Option<(S, &Vec<S>)> = None;
            for (&t, value) in candidates.iter() {
                if !is_prefix(rem, value) {
                    continue;
                }
                let is_better = match best {
                    None => true,
                    Some((best_t, best_value)) => {
                        value.len() > best_value.len()
                            || (value.len() == best_value.len() && t < best_t)
                    }
                };
                if is_better {
                    best = Some((t, value));
                }
            }

            match best {
                Some((t, value)) => {
                    out.push(t);
                    i += value.len();
                    ctx = t;
                }
                None => {
                    if ctx == S::zero() {
                        return Err(WordchipperError::unknown_token(rem[0]));
                    }
                    out.push(S::zero());
                    ctx = S::zero();
                }
            }
        }

        Ok(out)
    }

    /// Decode `tokens`, walking context to the most recently decoded id.
    ///
    /// ## Arguments
    /// * `tokens` - The ids to decode.
    pub fn decode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        let mut out = Vec::new();
        let mut ctx = S::zero();
        for &t in tokens {
            let value = self
                .context_map
                .get(&ctx)
                .and_then(|m| m.get(&t))
                .ok_or_else(|| WordchipperError::unknown_token(t))?;
            out.extend(value.iter().copied());
            ctx = t;
        }
        Ok(out)
    }

    /// The learned context map, exposed for inspection.
    pub fn context_map(&self) -> &CommonHashMap<S, CommonHashMap<S, Vec<S>>> {
        &self.context_map
    }

    /// The learned input vocabulary.
    pub fn input_vocab(&self) -> &BTreeSet<S> {
        &self.input_vocab
    }
}

impl<S: Symbol> TokenizerStage<S> for ContextualEncoder<S> {
    fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        ContextualEncoder::learn(self, tokens, input_vocab)
    }

    fn encode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        ContextualEncoder::encode(self, tokens)
    }

    fn decode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        ContextualEncoder::decode(self, tokens)
    }

    fn input_vocab(&self) -> HashSet<S> {
        self.input_vocab.iter().copied().collect()
    }

    fn output_vocab(&self) -> HashSet<S> {
        let mut out: HashSet<S> = self.input_vocab.iter().copied().collect();
        out.insert(S::zero());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_context_is_singleton_fallback() {
        let tokens: Vec<i32> = vec![1, 2, 1, 3, 1, 2, 1, 3];
        let mut ce = ContextualOptions::new().init().unwrap();
        ce.learn(&tokens, None).unwrap();

        for &v in ce.input_vocab() {
            assert_eq!(ce.context_map()[&0][&v], vec![v]);
            assert_eq!(ce.context_map()[&v][&0], Vec::<i32>::new());
        }
    }

    #[test]
    fn test_contextual_round_trip() {
        let tokens: Vec<i32> = vec![1, 2, 1, 3, 1, 2, 1, 3];
        let mut ce = ContextualOptions::new().init().unwrap();
        ce.learn(&tokens, None).unwrap();

        let encoded = ce.encode(&tokens).unwrap();
        let decoded = ce.decode(&encoded).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn test_decode_unknown_token_fails() {
        let ce: ContextualEncoder<i32> = ContextualOptions::new().init().unwrap();
        let err = ce.decode(&[999]).unwrap_err();
        assert!(matches!(err, WordchipperError::UnknownToken { .. }));
    }
}
