//! # BPE Tokenizer
//!
//! Iterative most-frequent-pair merge learner, merge-replay encoder, and
//! expansion decoder.

use std::collections::{BTreeSet, HashSet};

use crate::errors::{WCResult, WordchipperError};
use crate::primitives::{merge_pairs, most_frequent_pair, pair_stats};
use crate::stage::TokenizerStage;
use crate::types::{CommonHashMap, Pair, Symbol};

/// A single learned merge: the pair it replaces, and the id it produces.
///
/// The first `|input_vocab|` entries of a trained [`BpeTokenizer`]'s merge
/// list are "seeding" entries with `pair.0 == 0`; these exist only to give
/// every input symbol an entry in `token_values` and never fire during
/// [`BpeTokenizer::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeEntry<S: Symbol> {
    /// The pair this merge replaces.
    pub pair: Pair<S>,
    /// The id this merge produces.
    pub id: S,
}

/// Options for constructing a [`BpeTokenizer`].
#[derive(Debug, Clone, Default)]
pub struct BpeOptions {
    /// Upper bound on the total length of the merge list, seeding entries
    /// included. At least one of `max_output_vocab`/`max_merges` must be
    /// set.
    pub max_output_vocab: Option<usize>,

    /// Upper bound on the number of *real* (non-seeding) merges to learn.
    /// If `max_output_vocab` is not also given, it is resolved during
    /// `learn` as `max_merges + |input_vocab|`.
    pub max_merges: Option<usize>,
}

impl BpeOptions {
    /// Create empty options; at least one bound must be set before
    /// `init`/`learn`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target output vocab size (seeding entries included).
    ///
    /// ## Arguments
    /// * `max_output_vocab` - The desired bound.
    pub fn with_max_output_vocab(
        self,
        max_output_vocab: usize,
    ) -> Self {
        Self {
            max_output_vocab: Some(max_output_vocab),
            ..self
        }
    }

    /// Set the target number of real merges to learn.
    ///
    /// ## Arguments
    /// * `max_merges` - The desired bound.
    pub fn with_max_merges(
        self,
        max_merges: usize,
    ) -> Self {
        Self {
            max_merges: Some(max_merges),
            ..self
        }
    }

    /// Initialize a [`BpeTokenizer`] from these options.
    ///
    /// ## Returns
    /// A `Result` containing the new tokenizer, or a [`WordchipperError::ConfigError`]
    /// if neither bound is set.
    pub fn init<S: Symbol>(self) -> WCResult<BpeTokenizer<S>> {
        BpeTokenizer::new(self)
    }
}

/// Byte-pair-encoding tokenizer over abstract integer symbols.
#[derive(Debug, Clone)]
pub struct BpeTokenizer<S: Symbol> {
    options: BpeOptions,
    merges: Vec<MergeEntry<S>>,
    token_values: CommonHashMap<S, Vec<S>>,
    input_vocab: BTreeSet<S>,
    output_vocab: HashSet<S>,
}

impl<S: Symbol> BpeTokenizer<S> {
    /// Construct a new, untrained tokenizer.
    ///
    /// ## Arguments
    /// * `options` - Trainer options; at least one of `max_output_vocab`/
    ///   `max_merges` must be set.
    ///
    /// ## Returns
    /// A `Result` containing the new tokenizer, or [`WordchipperError::ConfigError`].
    pub fn new(options: BpeOptions) -> WCResult<Self> {
        if options.max_output_vocab.is_none() && options.max_merges.is_none() {
            return Err(WordchipperError::ConfigError(
                "BpeTokenizer requires max_output_vocab or max_merges".into(),
            ));
        }
        Ok(Self {
            options,
            merges: Vec::new(),
            token_values: CommonHashMap::new(),
            input_vocab: BTreeSet::new(),
            output_vocab: HashSet::new(),
        })
    }

    /// The learned merge list, seeding entries included.
    pub fn merges(&self) -> &[MergeEntry<S>] {
        &self.merges
    }

    /// The expansion of each learned id to input-vocabulary symbols.
    pub fn token_values(&self) -> &CommonHashMap<S, Vec<S>> {
        &self.token_values
    }

    /// Train the tokenizer from scratch on `tokens`.
    ///
    /// If `input_vocab` is `None`, the vocabulary is derived from `tokens`
    /// in first-seen order. If `input_vocab` is given explicitly, it is
    /// iterated in ascending sorted order instead (see `DESIGN.md` for the
    /// resolved Open Question on vocabulary iteration order).
    ///
    /// ## Arguments
    /// * `tokens` - The training sequence.
    /// * `input_vocab` - An optional explicit input vocabulary.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, tokens)))]
    pub fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        self.merges.clear();
        self.token_values.clear();
        self.input_vocab.clear();
        self.output_vocab.clear();

        let ordered_vocab: Vec<S> = match input_vocab {
            Some(v) => v.iter().copied().collect::<BTreeSet<_>>().into_iter().collect(),
            None => {
                let mut seen = HashSet::new();
                let mut order = Vec::new();
                for &t in tokens {
                    if seen.insert(t) {
                        order.push(t);
                    }
                }
                order
            }
        };

        for &v in &ordered_vocab {
            self.merges.push(MergeEntry {
                pair: (S::zero(), v),
                id: v,
            });
            self.token_values.insert(v, vec![v]);
            self.input_vocab.insert(v);
            self.output_vocab.insert(v);
        }

        let max_output_vocab = match (self.options.max_output_vocab, self.options.max_merges) {
            (Some(bound), _) => bound,
            (None, Some(max_merges)) => max_merges + self.input_vocab.len(),
            (None, None) => unreachable!("validated at construction"),
        };

        if tokens.len() < 2 || self.input_vocab.is_empty() {
            return Ok(());
        }

        let mut working: Vec<S> = tokens.to_vec();
        let mut next_id = *self
            .input_vocab
            .iter()
            .max()
            .expect("non-empty vocab")
            + S::one();

        log::debug!(
            "BPE learn: {} input symbols, target merge-list length {}",
            self.input_vocab.len(),
            max_output_vocab
        );

        while self.merges.len() < max_output_vocab {
            let stats = pair_stats(&working);
            let Some((pair, count)) = most_frequent_pair(&stats) else {
                break;
            };
            if count <= 1 {
                break;
            }

            let new_id = next_id;
            next_id = next_id + S::one();

            working = merge_pairs(&working, pair, new_id);

            let expansion = {
                let mut v = self.token_values.get(&pair.0).cloned().unwrap_or_default();
                v.extend(self.token_values.get(&pair.1).cloned().unwrap_or_default());
                v
            };
            self.token_values.insert(new_id, expansion);
            self.merges.push(MergeEntry { pair, id: new_id });
            self.output_vocab.insert(new_id);

            log::trace!("BPE merge: {:?} -> {} (count {})", pair, new_id, count);
        }

        log::info!(
            "BPE learn finished: {} merges ({} seeding, {} real)",
            self.merges.len(),
            self.input_vocab.len(),
            self.merges.len() - self.input_vocab.len()
        );

        Ok(())
    }

    /// Encode `tokens` by replaying the learned merges in order.
    ///
    /// Seeding entries (`pair.0 == 0`) never fire. O(|merges| · |tokens|).
    ///
    /// ## Arguments
    /// * `tokens` - The sequence to encode.
    pub fn encode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        let mut working = tokens.to_vec();
        for merge in &self.merges {
            if merge.pair.0 == S::zero() {
                continue;
            }
            working = merge_pairs(&working, merge.pair, merge.id);
        }
        Ok(working)
    }

    /// Decode `tokens` by expanding each id via `token_values`.
    ///
    /// Unknown ids (should not occur for well-formed input) pass through
    /// unchanged.
    ///
    /// ## Arguments
    /// * `tokens` - The ids to decode.
    pub fn decode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        let mut out = Vec::with_capacity(tokens.len());
        for &t in tokens {
            match self.token_values.get(&t) {
                Some(expansion) => out.extend(expansion.iter().copied()),
                None => out.push(t),
            }
        }
        Ok(out)
    }

    /// The learned input vocabulary.
    pub fn input_vocab(&self) -> &BTreeSet<S> {
        &self.input_vocab
    }

    /// The learned output vocabulary: input symbols plus freshly minted
    /// merge ids.
    pub fn output_vocab(&self) -> &HashSet<S> {
        &self.output_vocab
    }
}

impl<S: Symbol> TokenizerStage<S> for BpeTokenizer<S> {
    fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        BpeTokenizer::learn(self, tokens, input_vocab)
    }

    fn encode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        BpeTokenizer::encode(self, tokens)
    }

    fn decode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        BpeTokenizer::decode(self, tokens)
    }

    fn input_vocab(&self) -> HashSet<S> {
        self.input_vocab.iter().copied().collect()
    }

    fn output_vocab(&self) -> HashSet<S> {
        self.output_vocab.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_a_bound() {
        let err = BpeOptions::new().init::<i32>().unwrap_err();
        assert!(matches!(err, WordchipperError::ConfigError(_)));
    }

    #[test]
    fn test_max_merges_resolves_output_vocab() {
        let tokens: Vec<i32> = vec![1, 2, 1, 2, 1, 2];
        let mut bpe = BpeOptions::new().with_max_merges(1).init::<i32>().unwrap();
        bpe.learn(&tokens, None).unwrap();
        // 2 seeds (for symbols 1 and 2) + up to 1 real merge.
        assert!(bpe.merges().len() <= 3);
    }

    #[test]
    fn test_wikipedia_example() {
        // "aaabdaaabac" -> most frequent pair (97,97) should merge first.
        let text = "aaabdaaabac";
        let tokens: Vec<i32> = text.bytes().map(|b| b as i32).collect();

        let mut bpe = BpeOptions::new()
            .with_max_output_vocab(10)
            .init::<i32>()
            .unwrap();
        bpe.learn(&tokens, None).unwrap();

        let first_real_merge = bpe
            .merges()
            .iter()
            .find(|m| m.pair.0 != 0)
            .expect("at least one real merge");
        assert_eq!(first_real_merge.pair, (97, 97));

        let encoded = bpe.encode(&tokens).unwrap();
        let decoded = bpe.decode(&encoded).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn test_short_input_finalizes_without_merging() {
        let mut bpe = BpeOptions::new()
            .with_max_output_vocab(100)
            .init::<i32>()
            .unwrap();
        bpe.learn(&[7], None).unwrap();
        assert_eq!(bpe.merges().len(), 1);
        assert_eq!(bpe.decode(&bpe.encode(&[7]).unwrap()).unwrap(), vec![7]);
    }

    #[test]
    fn test_round_trip_random_like_sequence() {
        let tokens: Vec<i32> = vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 1, 2, 3, 3, 3, 4];
        let mut bpe = BpeOptions::new()
            .with_max_output_vocab(20)
            .init::<i32>()
            .unwrap();
        bpe.learn(&tokens, None).unwrap();

        let encoded = bpe.encode(&tokens).unwrap();
        assert!(encoded.len() <= tokens.len());
        for id in &encoded {
            assert!(bpe.output_vocab().contains(id));
        }
        let decoded = bpe.decode(&encoded).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn test_merge_list_bounded_by_max_output_vocab() {
        let tokens: Vec<i32> = (0..200).map(|i| i % 5).collect();
        let mut bpe = BpeOptions::new()
            .with_max_output_vocab(8)
            .init::<i32>()
            .unwrap();
        bpe.learn(&tokens, None).unwrap();
        assert!(bpe.merges().len() <= 8);
    }

    #[test]
    fn test_learn_is_idempotent() {
        let tokens: Vec<i32> = vec![1, 1, 2, 1, 1, 2, 3];
        let mut bpe = BpeOptions::new()
            .with_max_output_vocab(10)
            .init::<i32>()
            .unwrap();
        bpe.learn(&tokens, None).unwrap();
        let merges_first = bpe.merges().to_vec();
        bpe.learn(&tokens, None).unwrap();
        assert_eq!(bpe.merges().to_vec(), merges_first);
    }

    #[test]
    fn test_explicit_input_vocab_is_sorted_ascending() {
        let tokens: Vec<i32> = vec![3, 1, 1, 3];
        let vocab = [3, 1];
        let mut bpe = BpeOptions::new()
            .with_max_output_vocab(10)
            .init::<i32>()
            .unwrap();
        bpe.learn(&tokens, Some(&vocab)).unwrap();
        let seeds: Vec<i32> = bpe
            .merges()
            .iter()
            .filter(|m| m.pair.0 == 0)
            .map(|m| m.pair.1)
            .collect();
        assert_eq!(seeds, vec![1, 3]);
    }
}
