//! In-process driver with per-key versions and commit-time validation.
//!
//! ## Design
//!
//! - `entries` and `versions` are concurrent maps keyed by backend key.
//! - `clock` is a global counter; each committing transaction allocates
//!   one version and stamps it on every key it writes.
//! - `commit_lock` serializes validate+apply, so a concurrent writer
//!   cannot slip in between a watch check passing and the batch
//!   landing.
//!
//! Speculative reads run live without the lock. The watch versions
//! captured before the body ran are re-checked under the lock; a
//! mismatch discards the batch and re-runs the body. Every write
//! command bumps its key's version, including writes that do not change
//! the stored bytes, so concurrent watchers always observe
//! interference. Deleted keys keep their last version as a tombstone
//! for the same reason.
//!
//! A kind mismatch mid-batch aborts the remaining commands; commands
//! already applied from that batch remain. The collection catalog never
//! issues mixed-kind batches, so this is reachable only by foreign
//! writers sharing the backend.

use crate::entry::Entry;
use crate::offsets::resolve_range;
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tidepool_core::{
    BackendKey, Batch, Command, Driver, Error, Replies, Reply, Result, Speculation,
};

/// In-memory [`Driver`] for tests and single-process embedding.
pub struct MemoryDriver {
    entries: DashMap<BackendKey, Entry>,
    versions: DashMap<BackendKey, u64>,
    clock: AtomicU64,
    commit_lock: Mutex<()>,
    retry_limit: Option<usize>,
}

impl MemoryDriver {
    /// Empty store with an unbounded retry loop.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            versions: DashMap::new(),
            clock: AtomicU64::new(0),
            commit_lock: Mutex::new(()),
            retry_limit: None,
        }
    }

    /// Allow at most `limit` retries after the initial attempt, then
    /// surface [`Error::Conflict`]. Zero disables retrying entirely.
    pub fn with_retry_limit(mut self, limit: usize) -> Self {
        self.retry_limit = Some(limit);
        self
    }

    /// Number of live backend keys.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    fn version_of(&self, key: &BackendKey) -> u64 {
        self.versions.get(key).map(|v| *v).unwrap_or(0)
    }

    fn bump(&self, key: &BackendKey, txn_version: &mut Option<u64>) {
        let version =
            *txn_version.get_or_insert_with(|| self.clock.fetch_add(1, Ordering::SeqCst) + 1);
        self.versions.insert(key.clone(), version);
    }

    /// Apply a validated batch. Caller holds the commit lock.
    fn apply(&self, batch: Batch) -> Result<Replies> {
        let mut replies = Vec::with_capacity(batch.len());
        let mut txn_version: Option<u64> = None;
        for command in batch {
            let is_write = command.is_write();
            let key = command.key().clone();
            replies.push(self.apply_one(command)?);
            if is_write {
                self.bump(&key, &mut txn_version);
            }
        }
        Ok(Replies::new(replies))
    }

    fn apply_one(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Delete(key) => {
                self.entries.remove(&key);
                Ok(Reply::Unit)
            }

            // -- string kind --------------------------------------------
            Command::Set(key, value) => {
                self.entries.insert(key, Entry::Str(value));
                Ok(Reply::Unit)
            }
            Command::Append(key, tail) => {
                let mut entry = self.entries.entry(key).or_insert_with(|| Entry::Str(Vec::new()));
                entry.as_str_mut()?.extend_from_slice(&tail);
                Ok(Reply::Unit)
            }
            Command::SetRange(key, offset, patch) => {
                let mut entry = self.entries.entry(key).or_insert_with(|| Entry::Str(Vec::new()));
                let bytes = entry.as_str_mut()?;
                let offset = offset as usize;
                let end = offset + patch.len();
                if bytes.len() < end {
                    bytes.resize(end, 0);
                }
                bytes[offset..end].copy_from_slice(&patch);
                Ok(Reply::Unit)
            }
            Command::Get(key) => match self.entries.get(&key) {
                Some(entry) => Ok(Reply::MaybeBytes(Some(entry.as_str()?.clone()))),
                None => Ok(Reply::MaybeBytes(None)),
            },
            Command::GetRange(key, start, stop) => {
                let bytes = match self.entries.get(&key) {
                    Some(entry) => {
                        let value = entry.as_str()?;
                        match resolve_range(value.len(), start, stop) {
                            Some((lo, hi)) => value[lo..=hi].to_vec(),
                            None => Vec::new(),
                        }
                    }
                    None => Vec::new(),
                };
                Ok(Reply::Bytes(bytes))
            }
            Command::StrLen(key) => match self.entries.get(&key) {
                Some(entry) => Ok(Reply::Count(entry.as_str()?.len() as u64)),
                None => Ok(Reply::Count(0)),
            },

            // -- list kind ----------------------------------------------
            Command::ListPush(key, items) => {
                let mut entry = self.entries.entry(key).or_insert_with(|| Entry::List(Vec::new()));
                entry.as_list_mut()?.extend(items);
                Ok(Reply::Unit)
            }
            Command::ListSet(key, index, item) => {
                let index_usize = index as usize;
                let mut entry = self
                    .entries
                    .get_mut(&key)
                    .ok_or(Error::IndexOutOfRange {
                        index: index as i64,
                        len: 0,
                    })?;
                let items = entry.as_list_mut()?;
                if index_usize >= items.len() {
                    let len = items.len() as u64;
                    return Err(Error::IndexOutOfRange {
                        index: index as i64,
                        len,
                    });
                }
                items[index_usize] = item;
                Ok(Reply::Unit)
            }
            Command::ListIndex(key, index) => {
                let item = match self.entries.get(&key) {
                    Some(entry) => {
                        let items = entry.as_list()?;
                        resolve_range(items.len(), index, index)
                            .map(|(lo, _)| items[lo].clone())
                    }
                    None => None,
                };
                Ok(Reply::MaybeBytes(item))
            }
            Command::ListRange(key, start, stop) => {
                let items = match self.entries.get(&key) {
                    Some(entry) => {
                        let items = entry.as_list()?;
                        match resolve_range(items.len(), start, stop) {
                            Some((lo, hi)) => items[lo..=hi].to_vec(),
                            None => Vec::new(),
                        }
                    }
                    None => Vec::new(),
                };
                Ok(Reply::Items(items))
            }
            Command::ListLen(key) => match self.entries.get(&key) {
                Some(entry) => Ok(Reply::Count(entry.as_list()?.len() as u64)),
                None => Ok(Reply::Count(0)),
            },

            // -- set kind -----------------------------------------------
            Command::SetAdd(key, members) => {
                let mut entry = self
                    .entries
                    .entry(key)
                    .or_insert_with(|| Entry::Set(FxHashSet::default()));
                entry.as_set_mut()?.extend(members);
                Ok(Reply::Unit)
            }
            Command::SetRemove(key, member) => {
                if let Some(mut entry) = self.entries.get_mut(&key) {
                    entry.as_set_mut()?.remove(&member);
                }
                Ok(Reply::Unit)
            }
            Command::SetPop(key) => {
                let popped = match self.entries.get_mut(&key) {
                    Some(mut entry) => {
                        let members = entry.as_set_mut()?;
                        match members.iter().next().cloned() {
                            Some(member) => {
                                members.remove(&member);
                                Some(member)
                            }
                            None => None,
                        }
                    }
                    None => None,
                };
                Ok(Reply::MaybeBytes(popped))
            }
            Command::SetMembers(key) => {
                let members = match self.entries.get(&key) {
                    Some(entry) => entry.as_set()?.iter().cloned().collect(),
                    None => Default::default(),
                };
                Ok(Reply::Members(members))
            }
            Command::SetContains(key, member) => {
                let present = match self.entries.get(&key) {
                    Some(entry) => entry.as_set()?.contains(&member),
                    None => false,
                };
                Ok(Reply::Flag(present))
            }
            Command::SetLen(key) => match self.entries.get(&key) {
                Some(entry) => Ok(Reply::Count(entry.as_set()?.len() as u64)),
                None => Ok(Reply::Count(0)),
            },

            // -- hash kind ----------------------------------------------
            Command::HashPut(key, field, value) => {
                let mut entry = self
                    .entries
                    .entry(key)
                    .or_insert_with(|| Entry::Hash(FxHashMap::default()));
                entry.as_hash_mut()?.insert(field, value);
                Ok(Reply::Unit)
            }
            Command::HashPutMany(key, pairs) => {
                let mut entry = self
                    .entries
                    .entry(key)
                    .or_insert_with(|| Entry::Hash(FxHashMap::default()));
                entry.as_hash_mut()?.extend(pairs);
                Ok(Reply::Unit)
            }
            Command::HashPutIfAbsent(key, field, value) => {
                let mut entry = self
                    .entries
                    .entry(key)
                    .or_insert_with(|| Entry::Hash(FxHashMap::default()));
                let fields = entry.as_hash_mut()?;
                if fields.contains_key(&field) {
                    Ok(Reply::Flag(false))
                } else {
                    fields.insert(field, value);
                    Ok(Reply::Flag(true))
                }
            }
            Command::HashGet(key, field) => {
                let value = match self.entries.get(&key) {
                    Some(entry) => entry.as_hash()?.get(&field).cloned(),
                    None => None,
                };
                Ok(Reply::MaybeBytes(value))
            }
            Command::HashGetAll(key) => {
                let fields = match self.entries.get(&key) {
                    Some(entry) => entry
                        .as_hash()?
                        .iter()
                        .map(|(f, v)| (f.clone(), v.clone()))
                        .collect(),
                    None => Default::default(),
                };
                Ok(Reply::Fields(fields))
            }
            Command::HashDelete(key, field) => {
                let removed = match self.entries.get_mut(&key) {
                    Some(mut entry) => entry.as_hash_mut()?.remove(&field).is_some(),
                    None => false,
                };
                Ok(Reply::Count(u64::from(removed)))
            }
            Command::HashLen(key) => match self.entries.get(&key) {
                Some(entry) => Ok(Reply::Count(entry.as_hash()?.len() as u64)),
                None => Ok(Reply::Count(0)),
            },
        }
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDriver")
            .field("keys", &self.entries.len())
            .field("clock", &self.clock.load(Ordering::Relaxed))
            .field("retry_limit", &self.retry_limit)
            .finish()
    }
}

impl Driver for MemoryDriver {
    fn transaction(
        &self,
        watch: &[BackendKey],
        body: &mut dyn FnMut(&dyn Speculation) -> Result<Batch>,
    ) -> Result<Replies> {
        let mut failed = 0usize;
        loop {
            let snapshot: SmallVec<[u64; 2]> =
                watch.iter().map(|key| self.version_of(key)).collect();

            let reads = LiveReads { store: self };
            let batch = body(&reads)?;

            let guard = self.commit_lock.lock();
            let clean = watch
                .iter()
                .zip(snapshot.iter())
                .all(|(key, version)| self.version_of(key) == *version);
            if clean {
                let outcome = self.apply(batch);
                drop(guard);
                return match outcome {
                    Ok(replies) => {
                        if failed > 0 {
                            tracing::debug!(retries = failed, "transaction committed after retry");
                        }
                        Ok(replies)
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "batch apply failed");
                        Err(err)
                    }
                };
            }
            drop(guard);

            failed += 1;
            if let Some(limit) = self.retry_limit {
                if failed > limit {
                    tracing::warn!(retries = limit, "watched key kept changing; giving up");
                    return Err(Error::Conflict { retries: limit });
                }
            }
            tracing::debug!(attempt = failed, "watched key changed; retrying");
        }
    }
}

/// Speculative reads against live state.
struct LiveReads<'a> {
    store: &'a MemoryDriver,
}

impl Speculation for LiveReads<'_> {
    fn str_get(&self, key: &BackendKey) -> Result<Vec<u8>> {
        match self.store.entries.get(key) {
            Some(entry) => Ok(entry.as_str()?.clone()),
            None => Ok(Vec::new()),
        }
    }

    fn str_len(&self, key: &BackendKey) -> Result<u64> {
        match self.store.entries.get(key) {
            Some(entry) => Ok(entry.as_str()?.len() as u64),
            None => Ok(0),
        }
    }

    fn str_range(&self, key: &BackendKey, start: i64, stop: i64) -> Result<Vec<u8>> {
        match self.store.entries.get(key) {
            Some(entry) => {
                let bytes = entry.as_str()?;
                Ok(match resolve_range(bytes.len(), start, stop) {
                    Some((lo, hi)) => bytes[lo..=hi].to_vec(),
                    None => Vec::new(),
                })
            }
            None => Ok(Vec::new()),
        }
    }

    fn list_len(&self, key: &BackendKey) -> Result<u64> {
        match self.store.entries.get(key) {
            Some(entry) => Ok(entry.as_list()?.len() as u64),
            None => Ok(0),
        }
    }

    fn list_range(&self, key: &BackendKey, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        match self.store.entries.get(key) {
            Some(entry) => {
                let items = entry.as_list()?;
                Ok(match resolve_range(items.len(), start, stop) {
                    Some((lo, hi)) => items[lo..=hi].to_vec(),
                    None => Vec::new(),
                })
            }
            None => Ok(Vec::new()),
        }
    }

    fn set_members(&self, key: &BackendKey) -> Result<std::collections::HashSet<Vec<u8>>> {
        match self.store.entries.get(key) {
            Some(entry) => Ok(entry.as_set()?.iter().cloned().collect()),
            None => Ok(Default::default()),
        }
    }

    fn set_contains(&self, key: &BackendKey, member: &[u8]) -> Result<bool> {
        match self.store.entries.get(key) {
            Some(entry) => Ok(entry.as_set()?.contains(member)),
            None => Ok(false),
        }
    }

    fn hash_get_all(&self, key: &BackendKey) -> Result<std::collections::HashMap<Vec<u8>, Vec<u8>>> {
        match self.store.entries.get(key) {
            Some(entry) => Ok(entry
                .as_hash()?
                .iter()
                .map(|(f, v)| (f.clone(), v.clone()))
                .collect()),
            None => Ok(Default::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tidepool_core::Kind;

    fn key(name: &str) -> BackendKey {
        BackendKey::compose(Kind::Str, name)
    }

    #[test]
    fn batch_writes_and_reads_back() {
        let driver = MemoryDriver::new();
        let k = key("greeting");
        let mut slot = None;
        let replies = driver
            .transaction(&[k.clone()], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set(&k, b"hello".to_vec());
                slot = Some(batch.get(&k));
                Ok(batch)
            })
            .unwrap();
        // The buffered read runs after the buffered write.
        assert_eq!(replies.maybe_bytes(slot.unwrap()).unwrap(), Some(&b"hello"[..]));
    }

    #[test]
    fn missing_keys_read_as_empty_defaults() {
        let driver = MemoryDriver::new();
        let k = key("ghost");
        driver
            .transaction(&[k.clone()], &mut |spec| {
                assert_eq!(spec.str_get(&k).unwrap(), Vec::<u8>::new());
                assert_eq!(spec.str_len(&k).unwrap(), 0);
                assert!(spec
                    .set_members(&BackendKey::compose(Kind::Set, "ghost"))
                    .unwrap()
                    .is_empty());
                Ok(Batch::new())
            })
            .unwrap();
    }

    #[test]
    fn empty_batch_commits_with_no_replies() {
        let driver = MemoryDriver::new();
        let replies = driver
            .transaction(&[key("idle")], &mut |_spec| Ok(Batch::new()))
            .unwrap();
        assert!(replies.is_empty());
        assert_eq!(driver.key_count(), 0);
    }

    #[test]
    fn body_error_aborts_without_writes() {
        let driver = MemoryDriver::new();
        let k = key("victim");
        driver
            .transaction(&[k.clone()], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set(&k, b"before".to_vec());
                Ok(batch)
            })
            .unwrap();

        let mut runs = 0;
        let err = driver
            .transaction(&[k.clone()], &mut |_spec| {
                runs += 1;
                let mut batch = Batch::new();
                batch.set(&k, b"after".to_vec());
                // The buffered write above must be discarded.
                Err(Error::KeyNotFound)
            })
            .unwrap_err();
        assert!(matches!(err, Error::KeyNotFound));
        assert_eq!(runs, 1, "a failing body must not retry");

        let mut slot = None;
        let replies = driver
            .transaction(&[k.clone()], &mut |_spec| {
                let mut batch = Batch::new();
                slot = Some(batch.get(&k));
                Ok(batch)
            })
            .unwrap();
        assert_eq!(
            replies.maybe_bytes(slot.unwrap()).unwrap(),
            Some(&b"before"[..])
        );
    }

    #[test]
    fn interference_forces_rerun_against_fresh_state() {
        let driver = Arc::new(MemoryDriver::new());
        let k = key("contested");
        driver
            .transaction(&[k.clone()], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set(&k, b"a".to_vec());
                Ok(batch)
            })
            .unwrap();

        // First attempt mutates the watched key out-of-band, then the
        // retry appends to whatever it finds.
        let interferer = driver.clone();
        let mut attempts = 0;
        driver
            .transaction(&[k.clone()], &mut |spec| {
                attempts += 1;
                let seen = spec.str_get(&k)?;
                if attempts == 1 {
                    interferer
                        .transaction(&[], &mut |_spec| {
                            let mut batch = Batch::new();
                            batch.set(&k, b"ab".to_vec());
                            Ok(batch)
                        })
                        .unwrap();
                }
                let mut next = seen;
                next.push(b'!');
                let mut batch = Batch::new();
                batch.set(&k, next);
                Ok(batch)
            })
            .unwrap();
        assert_eq!(attempts, 2);

        let mut slot = None;
        let replies = driver
            .transaction(&[k.clone()], &mut |_spec| {
                let mut batch = Batch::new();
                slot = Some(batch.get(&k));
                Ok(batch)
            })
            .unwrap();
        // The committed effect applies to the interfering value.
        assert_eq!(replies.maybe_bytes(slot.unwrap()).unwrap(), Some(&b"ab!"[..]));
    }

    #[test]
    fn retry_bound_surfaces_conflict() {
        let driver = Arc::new(MemoryDriver::new().with_retry_limit(2));
        let k = key("storm");
        let interferer = driver.clone();
        let mut body_runs = 0;
        let err = driver
            .transaction(&[k.clone()], &mut |_spec| {
                body_runs += 1;
                // Bump the watched key on every attempt.
                interferer
                    .transaction(&[], &mut |_spec| {
                        let mut batch = Batch::new();
                        batch.append(&k, b"x".to_vec());
                        Ok(batch)
                    })
                    .unwrap();
                let mut batch = Batch::new();
                batch.set(&k, b"never".to_vec());
                Ok(batch)
            })
            .unwrap_err();
        match err {
            Error::Conflict { retries } => assert_eq!(retries, 2),
            other => panic!("unexpected error: {:?}", other),
        }
        // Initial attempt plus two retries.
        assert_eq!(body_runs, 3);
    }

    #[test]
    fn every_write_bumps_even_without_byte_changes() {
        let driver = MemoryDriver::new();
        let k = BackendKey::compose(Kind::Set, "s");
        driver
            .transaction(&[], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set_add(&k, vec![b"m".to_vec()]);
                Ok(batch)
            })
            .unwrap();
        let before = driver.version_of(&k);

        // Adding the same member changes nothing stored.
        driver
            .transaction(&[], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set_add(&k, vec![b"m".to_vec()]);
                Ok(batch)
            })
            .unwrap();
        assert!(driver.version_of(&k) > before);
    }

    #[test]
    fn delete_leaves_a_version_tombstone() {
        let driver = MemoryDriver::new();
        let k = key("fleeting");
        driver
            .transaction(&[], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set(&k, b"v".to_vec());
                Ok(batch)
            })
            .unwrap();
        let live = driver.version_of(&k);
        driver
            .transaction(&[], &mut |_spec| {
                let mut batch = Batch::new();
                batch.delete(&k);
                Ok(batch)
            })
            .unwrap();
        assert!(driver.version_of(&k) > live);
        assert_eq!(driver.key_count(), 0);
    }

    #[test]
    fn one_transaction_stamps_one_version() {
        let driver = MemoryDriver::new();
        let a = key("a");
        let b = key("b");
        driver
            .transaction(&[], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set(&a, b"1".to_vec());
                batch.set(&b, b"2".to_vec());
                batch.append(&a, b"1".to_vec());
                Ok(batch)
            })
            .unwrap();
        assert_eq!(driver.version_of(&a), driver.version_of(&b));
    }

    #[test]
    fn kind_mismatch_fails_the_command() {
        let driver = MemoryDriver::new();
        let k = key("typed");
        driver
            .transaction(&[], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set(&k, b"text".to_vec());
                Ok(batch)
            })
            .unwrap();
        let err = driver
            .transaction(&[], &mut |_spec| {
                let mut batch = Batch::new();
                batch.list_push(&k, vec![b"item".to_vec()]);
                Ok(batch)
            })
            .unwrap_err();
        assert!(matches!(err, Error::WrongKind { .. }));
    }

    #[test]
    fn range_reads_follow_backend_offsets() {
        let driver = MemoryDriver::new();
        let k = key("alphabet");
        driver
            .transaction(&[], &mut |_spec| {
                let mut batch = Batch::new();
                batch.set(&k, b"abcdef".to_vec());
                Ok(batch)
            })
            .unwrap();
        driver
            .transaction(&[k.clone()], &mut |spec| {
                assert_eq!(spec.str_range(&k, 0, -1).unwrap(), b"abcdef".to_vec());
                assert_eq!(spec.str_range(&k, 2, 3).unwrap(), b"cd".to_vec());
                assert_eq!(spec.str_range(&k, -2, -1).unwrap(), b"ef".to_vec());
                assert_eq!(spec.str_range(&k, 4, 100).unwrap(), b"ef".to_vec());
                assert_eq!(spec.str_range(&k, 5, 2).unwrap(), Vec::<u8>::new());
                Ok(Batch::new())
            })
            .unwrap();
    }
}
