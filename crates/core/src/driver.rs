//! The optimistic transaction contract.
//!
//! ## Design
//!
//! A transaction body runs against a [`Speculation`] handle for
//! immediate reads of live state and returns a [`Batch`] of buffered
//! commands. The driver validates the watched keys after the body
//! returns and applies the batch only if no watched key changed since
//! the body's reads began; otherwise it discards the batch and runs the
//! body again. First committer wins; losers observe fresh state on the
//! next attempt.
//!
//! Phase discipline is structural: a `Speculation` offers no way to
//! write and a `Batch` offers no way to observe live state, so a body
//! cannot interleave the two phases incorrectly.
//!
//! Individual speculative reads are atomic; joint consistency across
//! several reads is established retroactively by watch validation. A
//! body must therefore be free of external side effects, because it may
//! run any number of times before one attempt commits.

use crate::batch::{Batch, Replies};
use crate::error::Result;
use crate::key::BackendKey;
use std::collections::{HashMap, HashSet};

/// Read phase of a transaction attempt.
///
/// Missing keys read as empty defaults, never as errors; object
/// existence is a registry question, not a key-presence question.
pub trait Speculation {
    /// Whole byte-string value; empty when the key is missing.
    fn str_get(&self, key: &BackendKey) -> Result<Vec<u8>>;

    /// Byte length; zero when the key is missing.
    fn str_len(&self, key: &BackendKey) -> Result<u64>;

    /// Inclusive byte range; negative offsets count from the end.
    fn str_range(&self, key: &BackendKey, start: i64, stop: i64) -> Result<Vec<u8>>;

    /// Item count; zero when the key is missing.
    fn list_len(&self, key: &BackendKey) -> Result<u64>;

    /// Inclusive item range; negative offsets count from the end.
    fn list_range(&self, key: &BackendKey, start: i64, stop: i64) -> Result<Vec<Vec<u8>>>;

    /// All members; empty when the key is missing.
    fn set_members(&self, key: &BackendKey) -> Result<HashSet<Vec<u8>>>;

    /// Membership probe; false when the key is missing.
    fn set_contains(&self, key: &BackendKey, member: &[u8]) -> Result<bool>;

    /// All fields; empty when the key is missing.
    fn hash_get_all(&self, key: &BackendKey) -> Result<HashMap<Vec<u8>, Vec<u8>>>;
}

/// Backend offering watch-validated optimistic transactions.
///
/// `transaction` re-runs `body` until one attempt's batch commits
/// cleanly against the watched keys. A body error aborts immediately
/// with zero writes and no retry; it is how guard failures and
/// speculative-phase errors surface.
pub trait Driver: Send + Sync {
    /// Run one optimistic transaction to completion.
    fn transaction(
        &self,
        watch: &[BackendKey],
        body: &mut dyn FnMut(&dyn Speculation) -> Result<Batch>,
    ) -> Result<Replies>;
}
