//! # Hierarchical LZ
//!
//! A family of per-context [`LzCoder`]s that share one output-token
//! namespace. The active context is the most recently emitted id; each
//! context keeps its own dictionary, but new ids are chosen by a
//! cross-context vote so that independent contexts tend to converge on the
//! same id for the same substring.

use std::collections::HashSet;

use crate::errors::{WCResult, WordchipperError};
use crate::lz::LzCoder;
use crate::stage::TokenizerStage;
use crate::types::{CommonHashMap, Symbol, no_token_sentinel};

/// Options for constructing a [`HierarchicalLz`] coder.
#[derive(Debug, Clone)]
pub struct HierarchicalLzOptions<S: Symbol> {
    /// The bound on each per-context coder's output-id namespace.
    pub vocab_size: usize,
    /// The initial input vocabulary, registered in the empty context.
    pub input_vocab: Vec<S>,
}

impl<S: Symbol> HierarchicalLzOptions<S> {
    /// Create options with the given vocab size bound and an empty initial
    /// vocabulary.
    ///
    /// ## Arguments
    /// * `vocab_size` - The bound on each context's output-id namespace.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            input_vocab: Vec::new(),
        }
    }

    /// Set the initial input vocabulary, registered under the empty
    /// context.
    ///
    /// ## Arguments
    /// * `input_vocab` - The symbols to pre-register.
    pub fn with_input_vocab(
        self,
        input_vocab: &[S],
    ) -> Self {
        Self {
            input_vocab: input_vocab.to_vec(),
            ..self
        }
    }

    /// Initialize a [`HierarchicalLz`] from these options.
    pub fn init(self) -> WCResult<HierarchicalLz<S>> {
        HierarchicalLz::new(self.vocab_size, &self.input_vocab)
    }
}

/// Hierarchical LZ coder: one [`LzCoder`] per context symbol, cooperating
/// via a cross-context vote on new-id allocation.
#[derive(Debug, Clone)]
pub struct HierarchicalLz<S: Symbol> {
    vocab_size: usize,
    coders: CommonHashMap<S, LzCoder<S>>,
}

/// The distinguished context key representing "no prior token yet".
///
/// Reuses the trie's out-of-band sentinel (`-1`): every id an `LzCoder` can
/// actually emit is non-negative (drawn from `0..vocab_size-1` or an
/// existing registered symbol), so this never collides with a real context.
fn empty_context<S: Symbol>() -> S {
    no_token_sentinel()
}

impl<S: Symbol> HierarchicalLz<S> {
    /// Construct a new hierarchical coder, seeding the empty context with
    /// `input_vocab`.
    ///
    /// ## Arguments
    /// * `vocab_size` - The bound on each context's output-id namespace.
    /// * `input_vocab` - The initial input vocabulary for the empty context.
    pub fn new(
        vocab_size: usize,
        input_vocab: &[S],
    ) -> WCResult<Self> {
        let mut coders = CommonHashMap::new();
        coders.insert(empty_context(), LzCoder::new(vocab_size, input_vocab)?);
        Ok(Self { vocab_size, coders })
    }

    /// The per-context coder table, exposed for inspection.
    pub fn coders(&self) -> &CommonHashMap<S, LzCoder<S>> {
        &self.coders
    }

    /// Propose and, if needed, commit the next token under context `ctx`.
    ///
    /// ## Arguments
    /// * `rem` - The remaining input to propose a token for.
    /// * `ctx` - The active context (the previously emitted id, or the
    ///   empty-context sentinel).
    /// * `learn` - Whether the active coder's dictionary may grow.
    pub fn encode_one(
        &mut self,
        rem: &[S],
        ctx: S,
        learn: bool,
    ) -> WCResult<(Vec<S>, S)> {
        if !self.coders.contains_key(&ctx) {
            if !learn {
                return Err(WordchipperError::unknown_context(ctx));
            }
            self.coders.insert(ctx, LzCoder::new(self.vocab_size, &[])?);
        }

        let (prefix, id) = self.coders[&ctx].propose_next_token(rem, learn);

        if self.coders[&ctx].encoded_vocab().contains_key(&id) {
            return Ok((prefix, id));
        }
        if !learn {
            return Err(WordchipperError::LearningDisabled);
        }

        let chosen = self.vote(rem, &ctx, learn);
        self.coders.get_mut(&ctx).unwrap().commit_new_token(&prefix, chosen)?;
        log::trace!("HLZ context {} learned new token {} -> {:?}", ctx, chosen, prefix);
        Ok((prefix, chosen))
    }

    /// Choose a new id for `rem` under the active context `ctx` by
    /// cross-context vote among the active coder's unused tokens.
    fn vote(
        &self,
        rem: &[S],
        ctx: &S,
        learn: bool,
    ) -> S {
        let active = &self.coders[ctx];
        let native = match active.unused_tokens().iter().next().copied() {
            Some(t) => t,
            None => return no_token_sentinel(),
        };

        let mut tally: CommonHashMap<S, u64> = CommonHashMap::new();
        for (other_ctx, coder) in &self.coders {
            if other_ctx == ctx {
                continue;
            }
            let (_prefix, proposed) = coder.propose_next_token(rem, learn);
            if coder.encoded_vocab().contains_key(&proposed) {
                *tally.entry(proposed).or_insert(0) += 1;
            }
        }

        let mut best = native;
        let mut best_count = *tally.get(&native).unwrap_or(&0);
        for &candidate in active.unused_tokens() {
            let count = *tally.get(&candidate).unwrap_or(&0);
            if count > best_count {
                best = candidate;
                best_count = count;
            }
        }
        best
    }

    /// Train the coder from scratch over `tokens`.
    ///
    /// ## Arguments
    /// * `tokens` - The training sequence.
    /// * `input_vocab` - An optional explicit input vocabulary for the
    ///   empty context.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, tokens)))]
    pub fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        let vocab: Vec<S> = match input_vocab {
            Some(v) => v.to_vec(),
            None => tokens
                .iter()
                .copied()
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect(),
        };
        *self = HierarchicalLz::new(self.vocab_size, &vocab)?;

        let mut ctx = empty_context();
        let mut rem = tokens;
        while !rem.is_empty() {
            let (prefix, id) = self.encode_one(rem, ctx, true)?;
            if prefix.is_empty() {
                break;
            }
            rem = &rem[prefix.len()..];
            ctx = id;
        }
        log::info!("Hierarchical LZ learn finished: {} contexts", self.coders.len());
        Ok(())
    }

    /// Encode `seq`, walking context to the most recently emitted id.
    ///
    /// ## Arguments
    /// * `seq` - The sequence to encode.
    /// * `learn` - Whether coders may grow while encoding.
    pub fn encode(
        &mut self,
        seq: &[S],
        learn: bool,
    ) -> WCResult<Vec<S>> {
        let mut out = Vec::new();
        let mut ctx = empty_context();
        let mut rem = seq;
        while !rem.is_empty() {
            let (prefix, id) = self.encode_one(rem, ctx, learn)?;
            if prefix.is_empty() {
                return Err(if learn {
                    WordchipperError::DictionaryFull
                } else {
                    WordchipperError::LearningDisabled
                });
            }
            out.push(id);
            rem = &rem[prefix.len()..];
            ctx = id;
        }
        Ok(out)
    }

    /// Decode `seq`, walking context to the most recently decoded id.
    ///
    /// This relies on `decode` always following an `encode` against the
    /// same instance; if `ctx` passes through a coder never trained for
    /// the id being decoded, the result is unspecified beyond the
    /// `UnknownContext` guard.
    ///
    /// ## Arguments
    /// * `seq` - The ids to decode.
    pub fn decode(
        &self,
        seq: &[S],
    ) -> WCResult<Vec<S>> {
        let mut out = Vec::new();
        let mut ctx = empty_context();
        for &id in seq {
            let coder = self
                .coders
                .get(&ctx)
                .ok_or_else(|| WordchipperError::unknown_context(ctx))?;
            out.extend(coder.decode_one(id)?);
            ctx = id;
        }
        Ok(out)
    }
}

impl<S: Symbol> TokenizerStage<S> for HierarchicalLz<S> {
    fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        HierarchicalLz::learn(self, tokens, input_vocab)
    }

    fn encode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        let mut clone = self.clone();
        clone.encode(tokens, false)
    }

    fn decode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        HierarchicalLz::decode(self, tokens)
    }

    fn input_vocab(&self) -> HashSet<S> {
        self.coders
            .get(&empty_context())
            .map(|c| c.input_vocab().iter().copied().collect())
            .unwrap_or_default()
    }

    fn output_vocab(&self) -> HashSet<S> {
        self.coders.values().flat_map(|c| c.encoded_vocab().keys().copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hlz_round_trip() {
        let tokens: Vec<i32> = vec![1, 2, 1, 2, 1, 2];
        let mut hlz = HierarchicalLzOptions::new(16).with_input_vocab(&[1, 2]).init().unwrap();
        hlz.learn(&tokens, Some(&[1, 2])).unwrap();

        let encoded = hlz.encode(&tokens, false).unwrap();
        let decoded = hlz.decode(&encoded).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn test_hlz_vote_converges_contexts_on_same_substring() {
        let tokens: Vec<i32> = vec![1, 2, 1, 2, 1, 2];
        let mut hlz = HierarchicalLzOptions::new(16).with_input_vocab(&[1, 2]).init().unwrap();
        hlz.learn(&tokens, Some(&[1, 2])).unwrap();

        let new_ids: HashSet<i32> = hlz
            .coders()
            .values()
            .flat_map(|c| c.encoded_vocab().iter())
            .filter(|(_, key)| key.len() > 1)
            .map(|(&id, _)| id)
            .collect();
        assert!(new_ids.len() <= 1, "multi-symbol tokens across contexts should converge: {new_ids:?}");
    }

    #[test]
    fn test_hlz_unknown_context_without_learning_fails() {
        let hlz: HierarchicalLz<i32> = HierarchicalLzOptions::new(8).init().unwrap();
        let err = hlz.decode(&[999]).unwrap_err();
        assert!(matches!(err, WordchipperError::UnknownContext { .. }));
    }
}
