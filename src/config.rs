//! Construction-time configuration for the trie variants.

use crate::error::{Result, TrieError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sizing knobs shared by all trie variants.
///
/// Defaults favor small dictionaries; all arrays grow on demand, so these
/// only control how much growth churn early insertion incurs.
///
/// # Examples
///
/// ```rust
/// use twintrie::{DoubleTrie, TrieConfig};
///
/// let config = TrieConfig {
///     initial_states: 4096,
///     ..Default::default()
/// };
/// let trie = DoubleTrie::with_config(config).unwrap();
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrieConfig {
    /// Initial length of the base/check state arrays.
    pub initial_states: usize,
    /// Initial length of the double trie's index and accept tables.
    pub initial_index: usize,
    /// Initial length of the suffix trie's tail array.
    pub initial_tail: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            initial_states: 512,
            initial_index: 1024,
            initial_tail: 256,
        }
    }
}

impl TrieConfig {
    /// Validate the configuration.
    ///
    /// Every capacity must stay inside the `i32` state/offset space; the
    /// `with_config` constructors call this before allocating anything.
    pub fn validate(&self) -> Result<()> {
        for cap in [self.initial_states, self.initial_index, self.initial_tail] {
            if cap > i32::MAX as usize {
                return Err(TrieError::capacity_exceeded(cap as u64));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(TrieConfig::default().validate().is_ok());
    }

    #[test]
    fn test_oversized_rejected() {
        let config = TrieConfig {
            initial_states: usize::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
