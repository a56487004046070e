//! # Common Types and Traits

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display};
use std::hash::Hash;

use num_traits::{FromPrimitive, PrimInt, Signed, ToPrimitive};

/// A type that can be used as a symbol in the tokenizers in this crate.
///
/// Symbols are signed, since §3 of the data model reserves `-1` (or any
/// distinct out-of-band value) as the "no token" sentinel inside the trie.
pub trait Symbol:
    'static
    + PrimInt
    + Signed
    + FromPrimitive
    + ToPrimitive
    + Hash
    + Default
    + Debug
    + Display
    + Send
    + Sync
{
}

impl<T> Symbol for T where
    T: 'static
        + PrimInt
        + Signed
        + FromPrimitive
        + ToPrimitive
        + Hash
        + Default
        + Debug
        + Display
        + Send
        + Sync
{
}

/// An ordered pair of symbols.
pub type Pair<S> = (S, S);

/// Type alias for hash maps in this crate.
pub type CommonHashMap<K, V> = HashMap<K, V>;

/// Type alias for hash sets in this crate.
pub type CommonHashSet<V> = HashSet<V>;

/// The sentinel symbol denoting the empty string / empty context.
///
/// ## Returns
/// `S::zero()`.
pub fn empty_symbol<S: Symbol>() -> S {
    S::zero()
}

/// The sentinel value denoting "no token" inside a [`crate::trie::Trie`].
///
/// ## Returns
/// `-S::one()`.
pub fn no_token_sentinel<S: Symbol>() -> S {
    -S::one()
}
