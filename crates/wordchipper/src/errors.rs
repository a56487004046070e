//! # Error Types

use crate::types::Symbol;

/// Errors from wordchipper tokenizer operations.
#[derive(Debug, thiserror::Error)]
pub enum WordchipperError {
    /// A tokenizer was constructed without enough configuration to learn a
    /// model (e.g. a BPE tokenizer with neither `max_output_vocab` nor
    /// `max_merges` set), or with mutually inconsistent bounds.
    #[error("config error: {0}")]
    ConfigError(String),

    /// An LZ-family coder could not allocate an id for a new input symbol
    /// because its unused-token pool is exhausted.
    #[error("vocab full: cannot allocate a token for input symbol {symbol}")]
    VocabFull {
        /// The input symbol that could not be registered.
        symbol: String,
    },

    /// An LZ-family coder's trie cannot grow past its configured
    /// `vocab_size` bound.
    #[error("dictionary full: cannot grow past vocab_size bound")]
    DictionaryFull,

    /// `encode`/`encode_one` needed to grow the model, but was called with
    /// `learn = false`.
    #[error("learning disabled: encode needs to extend the model")]
    LearningDisabled,

    /// Hierarchical LZ was asked to encode or decode under a context symbol
    /// not present in its coder table.
    #[error("unknown context: {context}")]
    UnknownContext {
        /// The context symbol that has no registered coder.
        context: String,
    },

    /// `decode_one`/`decode` was given an id absent from the model's
    /// dictionary (LZ `encoded_vocab`, BPE `token_values`, or the
    /// contextual encoder's `context_map`).
    #[error("unknown token: {token}")]
    UnknownToken {
        /// The unknown token id.
        token: String,
    },

    /// A helper was asked for an element of an empty set (e.g. the smallest
    /// unused token when no tokens remain unused).
    #[error("empty set: no element to select")]
    EmptySet,
}

impl WordchipperError {
    /// Build an [`WordchipperError::UnknownToken`] from a symbol.
    ///
    /// ## Arguments
    /// * `token` - The unrecognized token.
    pub fn unknown_token<S: Symbol>(token: S) -> Self {
        Self::UnknownToken {
            token: token.to_string(),
        }
    }

    /// Build an [`WordchipperError::UnknownContext`] from a symbol.
    ///
    /// ## Arguments
    /// * `context` - The unrecognized context symbol.
    pub fn unknown_context<S: Symbol>(context: S) -> Self {
        Self::UnknownContext {
            context: context.to_string(),
        }
    }

    /// Build an [`WordchipperError::VocabFull`] from a symbol.
    ///
    /// ## Arguments
    /// * `symbol` - The input symbol that could not be registered.
    pub fn vocab_full<S: Symbol>(symbol: S) -> Self {
        Self::VocabFull {
            symbol: symbol.to_string(),
        }
    }
}

/// Result type for wordchipper tokenizer operations.
pub type WCResult<T> = std::result::Result<T, WordchipperError>;
