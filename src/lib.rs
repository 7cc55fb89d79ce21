//! # Twintrie: Double-Array Trie Maps with Compressed Tails
//!
//! This crate maps arbitrary byte keys to positive integer values using a
//! double-array trie, with two variants that compress key tails differently:
//!
//! - [`DoubleTrie`]: a front trie joined to a reversed rear trie through an
//!   index/accept table, so keys sharing a suffix share one rear path.
//! - [`SuffixTrie`]: a front trie plus a flat tail array; any state with a
//!   single continuation stores the rest of its key as raw bytes.
//!
//! [`BasicTrie`] is the underlying base/check state machine, usable on its
//! own for plain key/value storage. Every variant serializes to a single
//! file that loads back through a read-only memory mapping
//! ([`MappedDoubleTrie`], [`MappedSuffixTrie`]).
//!
//! # Quick Start
//!
//! ```rust
//! use twintrie::{DoubleTrie, TrieMap, TrieSearch};
//!
//! let mut trie = DoubleTrie::new();
//! trie.insert(b"card", 1).unwrap();
//! trie.insert(b"care", 2).unwrap();
//! assert_eq!(trie.search(b"card"), Some(1));
//! assert_eq!(trie.search(b"ca"), None);
//! ```
//!
//! Instances are single-owner and not internally synchronized; readers and
//! writers sharing one instance need external synchronization.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod error;
pub mod fsa;
pub mod io;

// Re-export core types
pub use config::TrieConfig;
pub use error::{Result, TrieError};
pub use fsa::{
    char_in, char_out, BasicTrie, DoubleTrie, Relocator, StateTable, SuffixTrie, Symbol,
    TrieMap, TrieSearch, ALPHABET_SIZE, TERMINATOR,
};

#[cfg(feature = "mmap")]
pub use fsa::{MappedDoubleTrie, MappedSuffixTrie};

/// State identifier inside a trie's base/check arrays.
pub type StateId = u32;

/// Stored value type; values are strictly positive.
pub type Value = i32;

/// Library version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_re_exports() {
        let _trie = BasicTrie::new();
        let _double = DoubleTrie::new();
        let _suffix = SuffixTrie::new();
        let _config = TrieConfig::default();
        let _err = TrieError::invalid_value(0);
        assert_eq!(std::mem::size_of::<StateId>(), 4);
    }
}
