//! # LZ Tokenizer (Dictionary Coder)
//!
//! A trie-backed dictionary learner with unused-token allocation. The
//! tokenizer greedily matches the longest known prefix of the remaining
//! input, optionally extending the dictionary by one symbol past the match
//! when learning is enabled.

use std::collections::{BTreeSet, HashSet};

use crate::errors::{WCResult, WordchipperError};
use crate::stage::TokenizerStage;
use crate::trie::Trie;
use crate::types::{CommonHashMap, Symbol, no_token_sentinel};

/// Options for constructing an [`LzCoder`].
///
/// `vocab_size` bounds the dictionary: it is the size of the output-id
/// namespace `{0..vocab_size-1}` that `unused_tokens` is drawn from. This
/// crate requires `vocab_size` to always be set (see `DESIGN.md` for the
/// resolved Open Question on unbounded LZ coders, whose id-allocation
/// semantics are underspecified by the source).
#[derive(Debug, Clone)]
pub struct LzOptions<S: Symbol> {
    /// The bound on the output-id namespace.
    pub vocab_size: usize,
    /// The initial input vocabulary to pre-register.
    pub input_vocab: Vec<S>,
}

impl<S: Symbol> LzOptions<S> {
    /// Create options with the given vocab size bound and an empty initial
    /// vocabulary.
    ///
    /// ## Arguments
    /// * `vocab_size` - The bound on the output-id namespace.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            input_vocab: Vec::new(),
        }
    }

    /// Set the initial input vocabulary to pre-register.
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

    /// Initialize an [`LzCoder`] from these options.
    pub fn init(self) -> WCResult<LzCoder<S>> {
        LzCoder::new(self.vocab_size, &self.input_vocab)
    }
}

/// Trie-backed dictionary coder.
#[derive(Debug, Clone)]
pub struct LzCoder<S: Symbol> {
    vocab_size: usize,
    input_vocab: BTreeSet<S>,
    trie: Trie<S>,
    encoded_vocab: CommonHashMap<S, Vec<S>>,
    unused_tokens: BTreeSet<S>,
}

impl<S: Symbol> LzCoder<S> {
    /// Construct a new coder with the given vocab-size bound, pre-registering
    /// `input_vocab` (iterated in ascending sorted order, the resolved
    /// reading of "set-order" from the source).
    ///
    /// ## Arguments
    /// * `vocab_size` - The bound on the output-id namespace.
    /// * `input_vocab` - The initial input vocabulary to pre-register.
    ///
    /// ## Returns
    /// A `Result` containing the new coder, or [`WordchipperError::ConfigError`]
    /// if `input_vocab` is larger than `vocab_size`.
    pub fn new(
        vocab_size: usize,
        input_vocab: &[S],
    ) -> WCResult<Self> {
        let ordered_vocab: BTreeSet<S> = input_vocab.iter().copied().collect();
        if ordered_vocab.len() > vocab_size {
            return Err(WordchipperError::ConfigError(format!(
                "input_vocab ({}) exceeds vocab_size ({})",
                ordered_vocab.len(),
                vocab_size
            )));
        }

        let mut coder = Self {
            vocab_size,
            input_vocab: BTreeSet::new(),
            trie: Trie::new(),
            encoded_vocab: CommonHashMap::new(),
            unused_tokens: BTreeSet::new(),
        };
        coder.trie.insert(&[], no_token_sentinel());

        let mut unused: BTreeSet<S> = BTreeSet::new();
        let mut cursor = S::zero();
        for _ in 0..vocab_size {
            unused.insert(cursor);
            cursor = cursor + S::one();
        }
        coder.unused_tokens = unused;

        for &c in &ordered_vocab {
            let id = coder.smallest_unused()?;
            coder.add_new_token(&[c], id);
            coder.input_vocab.insert(c);
        }

        Ok(coder)
    }

    /// The effective bound on `trie.size()`, accounting for the always-present
    /// empty-key entry.
    fn effective_bound(&self) -> usize {
        self.vocab_size + 1
    }

    fn smallest_unused(&self) -> WCResult<S> {
        self.unused_tokens
            .iter()
            .next()
            .copied()
            .ok_or(WordchipperError::EmptySet)
    }

    fn add_new_token(
        &mut self,
        key: &[S],
        id: S,
    ) {
        self.encoded_vocab.insert(id, key.to_vec());
        self.trie.insert(key, id);
        self.unused_tokens.remove(&id);
    }

    /// Register every symbol in `seq` not already in `input_vocab`.
    ///
    /// ## Arguments
    /// * `seq` - The sequence to scan for unregistered symbols.
    ///
    /// ## Returns
    /// An error ([`WordchipperError::VocabFull`]) if no more ids can be
    /// allocated.
    pub fn update_vocab(
        &mut self,
        seq: &[S],
    ) -> WCResult<()> {
        for &c in seq {
            if self.input_vocab.contains(&c) {
                continue;
            }
            if self.trie.size() >= self.effective_bound() {
                return Err(WordchipperError::VocabFull {
                    symbol: c.to_string(),
                });
            }
            let id = self
                .smallest_unused()
                .map_err(|_| WordchipperError::vocab_full(c))?;
            self.add_new_token(&[c], id);
            self.input_vocab.insert(c);
        }
        Ok(())
    }

    /// Commit `key -> id` as a newly learned token, used by
    /// [`crate::hlz::HierarchicalLz`] to install a vote-chosen id rather
    /// than the coder's own native proposal.
    ///
    /// ## Arguments
    /// * `key` - The sequence to register.
    /// * `id` - The id to assign.
    pub fn commit_new_token(
        &mut self,
        key: &[S],
        id: S,
    ) -> WCResult<()> {
        if self.trie.size() >= self.effective_bound() {
            return Err(WordchipperError::DictionaryFull);
        }
        self.add_new_token(key, id);
        Ok(())
    }

    /// Propose, but do not commit, the next token for `seq`.
    ///
    /// ## Arguments
    /// * `seq` - The remaining input to propose a token for.
    /// * `learn` - Whether extension past the longest known match is
    ///   allowed.
    ///
    /// ## Returns
    /// `(prefix, id)`: the proposed prefix and its (possibly not yet
    /// registered) id.
    pub fn propose_next_token(
        &self,
        seq: &[S],
        learn: bool,
    ) -> (Vec<S>, S) {
        let (mut prefix, mut id) = self.trie.longest_prefix(seq);

        if learn && prefix.len() < seq.len() && self.trie.size() < self.effective_bound() {
            prefix.push(seq[prefix.len()]);
            if let Some(&smallest) = self.unused_tokens.iter().next() {
                id = smallest;
            }
        }

        (prefix, id)
    }

    /// Propose and, if learning is enabled and necessary, commit the next
    /// token for `seq`.
    ///
    /// ## Arguments
    /// * `seq` - The remaining input to encode one step of.
    /// * `learn` - Whether the dictionary may grow.
    pub fn encode_one(
        &mut self,
        seq: &[S],
        learn: bool,
    ) -> WCResult<(Vec<S>, S)> {
        let (prefix, id) = self.propose_next_token(seq, learn);

        if self.encoded_vocab.contains_key(&id) {
            return Ok((prefix, id));
        }
        if !learn {
            return Err(WordchipperError::LearningDisabled);
        }
        if self.trie.size() >= self.effective_bound() {
            return Err(WordchipperError::DictionaryFull);
        }

        self.add_new_token(&prefix, id);
        log::trace!("LZ learned new token {} -> {:?}", id, prefix);
        Ok((prefix, id))
    }

    /// Train the coder from scratch: reset the dictionary to
    /// `input_vocab`/`vocab_size` and greedily extend it over `tokens`.
    ///
    /// ## Arguments
    /// * `tokens` - The training sequence.
    /// * `input_vocab` - An optional explicit input vocabulary; defaults to
    ///   the distinct symbols of `tokens`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, tokens)))]
    pub fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        let vocab: Vec<S> = match input_vocab {
            Some(v) => v.to_vec(),
            None => tokens.iter().copied().collect::<BTreeSet<_>>().into_iter().collect(),
        };
        *self = LzCoder::new(self.vocab_size, &vocab)?;

        let mut rem = tokens;
        while !rem.is_empty() {
            let (prefix, _id) = self.encode_one(rem, true)?;
            if prefix.is_empty() {
                break;
            }
            rem = &rem[prefix.len()..];
        }
        log::info!(
            "LZ learn finished: dictionary size {} / {}",
            self.trie.size(),
            self.effective_bound()
        );
        Ok(())
    }

    /// Encode `seq`, consuming the longest known (or newly learned) prefix
    /// at each step.
    ///
    /// ## Arguments
    /// * `seq` - The sequence to encode.
    /// * `learn` - Whether the dictionary may grow while encoding.
    pub fn encode(
        &mut self,
        seq: &[S],
        learn: bool,
    ) -> WCResult<Vec<S>> {
        let mut out = Vec::new();
        let mut rem = seq;
        while !rem.is_empty() {
            let (prefix, id) = self.encode_one(rem, learn)?;
            if prefix.is_empty() {
                return Err(if learn {
                    WordchipperError::DictionaryFull
                } else {
                    WordchipperError::LearningDisabled
                });
            }
            out.push(id);
            rem = &rem[prefix.len()..];
        }
        Ok(out)
    }

    /// Decode a single id.
    ///
    /// ## Arguments
    /// * `id` - The id to decode.
    pub fn decode_one(
        &self,
        id: S,
    ) -> WCResult<Vec<S>> {
        self.encoded_vocab
            .get(&id)
            .cloned()
            .ok_or_else(|| WordchipperError::unknown_token(id))
    }

    /// Decode a sequence of ids.
    ///
    /// ## Arguments
    /// * `seq` - The ids to decode.
    pub fn decode(
        &self,
        seq: &[S],
    ) -> WCResult<Vec<S>> {
        let mut out = Vec::new();
        for &id in seq {
            out.extend(self.decode_one(id)?);
        }
        Ok(out)
    }

    /// The learned input vocabulary.
    pub fn input_vocab(&self) -> &BTreeSet<S> {
        &self.input_vocab
    }

    /// The dictionary: every registered id mapped to its expansion.
    pub fn encoded_vocab(&self) -> &CommonHashMap<S, Vec<S>> {
        &self.encoded_vocab
    }

    /// The ids in `{0..vocab_size-1}` not yet assigned.
    pub fn unused_tokens(&self) -> &BTreeSet<S> {
        &self.unused_tokens
    }

    /// The configured vocab-size bound.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// The underlying trie, exposed for inspection.
    pub fn trie(&self) -> &Trie<S> {
        &self.trie
    }
}

impl<S: Symbol> TokenizerStage<S> for LzCoder<S> {
    fn learn(
        &mut self,
        tokens: &[S],
        input_vocab: Option<&[S]>,
    ) -> WCResult<()> {
        LzCoder::learn(self, tokens, input_vocab)
    }

    fn encode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        // `encode` with learning disabled does not mutate state; cloning is
        // cheap relative to the alternative of threading `&mut self` through
        // the shared `TokenizerStage` trait.
        let mut clone = self.clone();
        clone.encode(tokens, false)
    }

    fn decode(
        &self,
        tokens: &[S],
    ) -> WCResult<Vec<S>> {
        LzCoder::decode(self, tokens)
    }

    fn input_vocab(&self) -> HashSet<S> {
        self.input_vocab.iter().copied().collect()
    }

    fn output_vocab(&self) -> HashSet<S> {
        self.encoded_vocab.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lz_round_trip() {
        let tokens: Vec<i32> = vec![1, 2, 1, 2, 3];
        let mut lz = LzOptions::new(8)
            .with_input_vocab(&[1, 2, 3])
            .init()
            .unwrap();
        lz.learn(&tokens, Some(&[1, 2, 3])).unwrap();

        let encoded = lz.encode(&tokens, false).unwrap();
        assert!(encoded.len() <= 3);
        let decoded = lz.decode(&encoded).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn test_bijection_trie_matches_encoded_vocab() {
        let tokens: Vec<i32> = vec![1, 2, 1, 2, 3, 1, 2, 1, 2];
        let mut lz = LzOptions::new(16).init().unwrap();
        lz.learn(&tokens, None).unwrap();

        for (&id, key) in lz.encoded_vocab() {
            assert_eq!(lz.trie().get(key), Some(id));
        }
    }

    #[test]
    fn test_unused_and_assigned_are_disjoint_and_bounded() {
        let tokens: Vec<i32> = vec![1, 2, 1, 2, 3, 1, 2, 1, 2, 3, 3];
        let mut lz = LzOptions::new(12).init().unwrap();
        lz.learn(&tokens, None).unwrap();

        let assigned: HashSet<i32> = lz.encoded_vocab().keys().copied().collect();
        let unused: HashSet<i32> = lz.unused_tokens().iter().copied().collect();
        assert!(assigned.is_disjoint(&unused));
        for t in assigned.union(&unused) {
            assert!(*t >= 0 && (*t as usize) < lz.vocab_size());
        }
    }

    #[test]
    fn test_learning_disabled_fails_on_unknown_symbol() {
        let mut lz = LzOptions::new(8)
            .with_input_vocab(&[1, 2])
            .init()
            .unwrap();
        let err = lz.encode(&[1, 2, 9], false).unwrap_err();
        assert!(matches!(err, WordchipperError::LearningDisabled));
    }

    #[test]
    fn test_vocab_exceeds_bound_is_config_error() {
        let err = LzOptions::new(2).with_input_vocab(&[1, 2, 3]).init().unwrap_err();
        assert!(matches!(err, WordchipperError::ConfigError(_)));
    }

    #[test]
    fn test_decode_unknown_token_fails() {
        let lz: LzCoder<i32> = LzOptions::new(8).init().unwrap();
        let err = lz.decode_one(999).unwrap_err();
        assert!(matches!(err, WordchipperError::UnknownToken { .. }));
    }
}
