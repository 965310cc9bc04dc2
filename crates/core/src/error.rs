//! Error taxonomy for Tidepool operations.
//!
//! One canonical enum shared by the driver and the collection catalog.
//! A body error (failed guard, bad index, missing member) aborts its
//! transaction with zero writes and is never retried. `Conflict` is
//! produced only by a driver whose retry bound ran out; an unbounded
//! driver never surfaces it.

use thiserror::Error;

/// All Tidepool errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Lifecycle guard failed: no object is registered at this key.
    #[error("object does not exist: {key}")]
    DoesNotExist {
        /// Logical key of the missing object.
        key: String,
    },

    /// Creation refused: an object is already registered at this key.
    #[error("object already exists: {key}")]
    AlreadyExists {
        /// Logical key of the existing object.
        key: String,
    },

    /// Positional index fell outside the bounds observed in-transaction.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Index as supplied by the caller.
        index: i64,
        /// Length observed inside the transaction.
        len: u64,
    },

    /// Sequence removal found no occurrence of the item.
    #[error("value not found in sequence")]
    ValueNotFound,

    /// Set member or mapping field was absent.
    #[error("key not found")]
    KeyNotFound,

    /// Input or stored bytes failed encoding validation.
    #[error("type rejected: {reason}")]
    TypeRejected {
        /// What failed validation.
        reason: String,
    },

    /// Backend entry holds a different kind than the command expects.
    ///
    /// Cannot arise through the collection catalog; it signals a
    /// foreign writer sharing the same backend.
    #[error("wrong kind: expected {expected}, got {actual}")]
    WrongKind {
        /// Kind required by the command.
        expected: &'static str,
        /// Kind found on the backend.
        actual: &'static str,
    },

    /// Optimistic validation kept failing until the retry bound ran out.
    #[error("transaction conflict after {retries} retries")]
    Conflict {
        /// Failed validation attempts before giving up.
        retries: usize,
    },

    /// Invariant violation inside the machinery (reply shape mismatch,
    /// a readback the watch should have made impossible).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Canonical result type for Tidepool operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for absence-style failures: the object, item, member, or
    /// field was not there.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::DoesNotExist { .. } | Error::ValueNotFound | Error::KeyNotFound
        )
    }

    /// True when the operation failed only because of concurrent
    /// interference on the watched key.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// True when simply re-running the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = Error::DoesNotExist {
            key: "scores".to_string(),
        };
        assert_eq!(err.to_string(), "object does not exist: scores");

        let err = Error::IndexOutOfRange { index: -4, len: 3 };
        assert_eq!(err.to_string(), "index -4 out of range for length 3");

        let err = Error::WrongKind {
            expected: "list",
            actual: "hash",
        };
        assert_eq!(err.to_string(), "wrong kind: expected list, got hash");
    }

    #[test]
    fn not_found_predicate() {
        assert!(Error::KeyNotFound.is_not_found());
        assert!(Error::ValueNotFound.is_not_found());
        assert!(Error::DoesNotExist {
            key: "x".to_string()
        }
        .is_not_found());
        assert!(!Error::Conflict { retries: 3 }.is_not_found());
    }

    #[test]
    fn conflict_predicates() {
        let err = Error::Conflict { retries: 8 };
        assert!(err.is_conflict());
        assert!(err.is_retryable());
        assert!(!Error::KeyNotFound.is_retryable());
    }
}
