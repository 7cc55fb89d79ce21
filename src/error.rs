//! Error handling for the twintrie library.

use thiserror::Error;

/// Main error type for all trie operations.
#[derive(Error, Debug)]
pub enum TrieError {
    /// A caller-supplied argument was unusable (e.g. an empty key).
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the offending argument
        message: String,
    },

    /// A stored value must be strictly positive.
    #[error("invalid value {value}: stored values must be > 0")]
    InvalidValue {
        /// The rejected value
        value: i32,
    },

    /// The state id space (or tail space) cannot grow any further.
    #[error("capacity exceeded: requested {requested} cells")]
    CapacityExceeded {
        /// Number of cells the failed growth asked for
        requested: u64,
    },

    /// I/O related errors from the persistence paths.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A trie file failed validation on load.
    #[error("corrupt file: {message}")]
    CorruptFile {
        /// What did not check out
        message: String,
    },
}

impl TrieError {
    /// Create an invalid argument error.
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(value: i32) -> Self {
        Self::InvalidValue { value }
    }

    /// Create a capacity exceeded error.
    pub fn capacity_exceeded(requested: u64) -> Self {
        Self::CapacityExceeded { requested }
    }

    /// Create a corrupt file error.
    pub fn corrupt_file<S: Into<String>>(message: S) -> Self {
        Self::CorruptFile {
            message: message.into(),
        }
    }

    /// Whether retrying the operation could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::InvalidArgument { .. } => false,
            Self::InvalidValue { .. } => false,
            Self::CapacityExceeded { .. } => false,
            Self::CorruptFile { .. } => false,
        }
    }
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, TrieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrieError::invalid_value(0);
        let display = format!("{}", err);
        assert!(display.contains("invalid value 0"));

        let err = TrieError::corrupt_file("magic mismatch");
        assert!(format!("{}", err).contains("magic mismatch"));
    }

    #[test]
    fn test_recoverability() {
        assert!(!TrieError::invalid_argument("empty key").is_recoverable());
        assert!(!TrieError::capacity_exceeded(1 << 40).is_recoverable());
        let io: TrieError = std::io::Error::new(std::io::ErrorKind::Interrupted, "x").into();
        assert!(io.is_recoverable());
    }
}
