//! Write-intent buffering and commit readback.
//!
//! A [`Batch`] is rebuilt from scratch on every optimistic retry, so it
//! holds plain data and no references into live state. Buffering a
//! command with output yields a [`Slot`]; after the batch commits, the
//! slot is redeemed against the returned [`Replies`].

use crate::command::{Command, Reply};
use crate::error::{Error, Result};
use crate::key::BackendKey;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Handle to one buffered command's reply.
///
/// Slots are positional within their batch. A slot from one attempt is
/// valid for any attempt of the same body because retries rebuild an
/// identically-shaped batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

/// Ordered buffer of commands for one transaction attempt.
#[derive(Debug, Default)]
pub struct Batch {
    commands: SmallVec<[Command; 8]>,
}

impl Batch {
    /// Empty batch. Committing it validates the watch and writes
    /// nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Buffered commands in execution order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn push(&mut self, command: Command) -> Slot {
        let slot = Slot(self.commands.len());
        self.commands.push(command);
        slot
    }

    // ------------------------------------------------------------------
    // Writes (no readback)
    // ------------------------------------------------------------------

    /// Buffer a whole-key delete.
    pub fn delete(&mut self, key: &BackendKey) {
        self.push(Command::Delete(key.clone()));
    }

    /// Buffer a whole-string overwrite.
    pub fn set(&mut self, key: &BackendKey, value: Vec<u8>) {
        self.push(Command::Set(key.clone(), value));
    }

    /// Buffer a string append.
    pub fn append(&mut self, key: &BackendKey, tail: Vec<u8>) {
        self.push(Command::Append(key.clone(), tail));
    }

    /// Buffer a positional byte overwrite.
    pub fn set_range(&mut self, key: &BackendKey, offset: u64, patch: Vec<u8>) {
        self.push(Command::SetRange(key.clone(), offset, patch));
    }

    /// Buffer a tail push of one or more items.
    pub fn list_push(&mut self, key: &BackendKey, items: Vec<Vec<u8>>) {
        self.push(Command::ListPush(key.clone(), items));
    }

    /// Buffer a positional item overwrite.
    pub fn list_set(&mut self, key: &BackendKey, index: u64, item: Vec<u8>) {
        self.push(Command::ListSet(key.clone(), index, item));
    }

    /// Buffer a member addition.
    pub fn set_add(&mut self, key: &BackendKey, members: Vec<Vec<u8>>) {
        self.push(Command::SetAdd(key.clone(), members));
    }

    /// Buffer a member removal; absent members are ignored.
    pub fn set_remove(&mut self, key: &BackendKey, member: Vec<u8>) {
        self.push(Command::SetRemove(key.clone(), member));
    }

    /// Buffer a field write.
    pub fn hash_put(&mut self, key: &BackendKey, field: Vec<u8>, value: Vec<u8>) {
        self.push(Command::HashPut(key.clone(), field, value));
    }

    /// Buffer a multi-field write.
    pub fn hash_put_many(&mut self, key: &BackendKey, entries: Vec<(Vec<u8>, Vec<u8>)>) {
        self.push(Command::HashPutMany(key.clone(), entries));
    }

    // ------------------------------------------------------------------
    // Commands with readback
    // ------------------------------------------------------------------

    /// Buffer a whole-string read.
    pub fn get(&mut self, key: &BackendKey) -> Slot {
        self.push(Command::Get(key.clone()))
    }

    /// Buffer an inclusive byte-range read.
    pub fn get_range(&mut self, key: &BackendKey, start: i64, stop: i64) -> Slot {
        self.push(Command::GetRange(key.clone(), start, stop))
    }

    /// Buffer a byte-length read.
    pub fn str_len(&mut self, key: &BackendKey) -> Slot {
        self.push(Command::StrLen(key.clone()))
    }

    /// Buffer a positional item read.
    pub fn list_index(&mut self, key: &BackendKey, index: i64) -> Slot {
        self.push(Command::ListIndex(key.clone(), index))
    }

    /// Buffer an inclusive item-range read.
    pub fn list_range(&mut self, key: &BackendKey, start: i64, stop: i64) -> Slot {
        self.push(Command::ListRange(key.clone(), start, stop))
    }

    /// Buffer an item-count read.
    pub fn list_len(&mut self, key: &BackendKey) -> Slot {
        self.push(Command::ListLen(key.clone()))
    }

    /// Buffer a fetch-one-and-remove on a set.
    pub fn set_pop(&mut self, key: &BackendKey) -> Slot {
        self.push(Command::SetPop(key.clone()))
    }

    /// Buffer a full-membership read.
    pub fn set_members(&mut self, key: &BackendKey) -> Slot {
        self.push(Command::SetMembers(key.clone()))
    }

    /// Buffer a membership probe.
    pub fn set_contains(&mut self, key: &BackendKey, member: Vec<u8>) -> Slot {
        self.push(Command::SetContains(key.clone(), member))
    }

    /// Buffer a member-count read.
    pub fn set_len(&mut self, key: &BackendKey) -> Slot {
        self.push(Command::SetLen(key.clone()))
    }

    /// Buffer a set-if-absent field write; the flag reply reports
    /// whether the write happened.
    pub fn hash_put_if_absent(&mut self, key: &BackendKey, field: Vec<u8>, value: Vec<u8>) -> Slot {
        self.push(Command::HashPutIfAbsent(key.clone(), field, value))
    }

    /// Buffer a field read.
    pub fn hash_get(&mut self, key: &BackendKey, field: Vec<u8>) -> Slot {
        self.push(Command::HashGet(key.clone(), field))
    }

    /// Buffer a whole-hash read.
    pub fn hash_get_all(&mut self, key: &BackendKey) -> Slot {
        self.push(Command::HashGetAll(key.clone()))
    }

    /// Buffer a field delete; the count reply reports 0 or 1.
    pub fn hash_delete(&mut self, key: &BackendKey, field: Vec<u8>) -> Slot {
        self.push(Command::HashDelete(key.clone(), field))
    }

    /// Buffer a field-count read.
    pub fn hash_len(&mut self, key: &BackendKey) -> Slot {
        self.push(Command::HashLen(key.clone()))
    }
}

impl IntoIterator for Batch {
    type Item = Command;
    type IntoIter = smallvec::IntoIter<[Command; 8]>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

/// Replies from a committed batch, one per buffered command.
#[derive(Debug)]
pub struct Replies {
    replies: Vec<Reply>,
}

impl Replies {
    /// Wrap the per-command replies of a committed batch.
    pub fn new(replies: Vec<Reply>) -> Self {
        Self { replies }
    }

    /// Number of replies (equals the committed batch length).
    pub fn len(&self) -> usize {
        self.replies.len()
    }

    /// True when the committed batch was empty.
    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    fn reply(&self, slot: Slot) -> Result<&Reply> {
        self.replies
            .get(slot.0)
            .ok_or_else(|| Error::Internal(format!("reply slot {} out of range", slot.0)))
    }

    fn mismatch(slot: Slot, want: &str, got: &Reply) -> Error {
        Error::Internal(format!(
            "reply slot {} holds {}, expected {}",
            slot.0,
            got.label(),
            want
        ))
    }

    /// Byte payload of a range read.
    pub fn bytes(&self, slot: Slot) -> Result<&[u8]> {
        match self.reply(slot)? {
            Reply::Bytes(bytes) => Ok(bytes),
            other => Err(Self::mismatch(slot, "bytes", other)),
        }
    }

    /// Optional byte payload of a point read.
    pub fn maybe_bytes(&self, slot: Slot) -> Result<Option<&[u8]>> {
        match self.reply(slot)? {
            Reply::MaybeBytes(bytes) => Ok(bytes.as_deref()),
            other => Err(Self::mismatch(slot, "maybe-bytes", other)),
        }
    }

    /// Items of a list-range read.
    pub fn items(&self, slot: Slot) -> Result<&[Vec<u8>]> {
        match self.reply(slot)? {
            Reply::Items(items) => Ok(items),
            other => Err(Self::mismatch(slot, "items", other)),
        }
    }

    /// Members of a set read.
    pub fn members(&self, slot: Slot) -> Result<&HashSet<Vec<u8>>> {
        match self.reply(slot)? {
            Reply::Members(members) => Ok(members),
            other => Err(Self::mismatch(slot, "members", other)),
        }
    }

    /// Field map of a hash read.
    pub fn fields(&self, slot: Slot) -> Result<&HashMap<Vec<u8>, Vec<u8>>> {
        match self.reply(slot)? {
            Reply::Fields(fields) => Ok(fields),
            other => Err(Self::mismatch(slot, "fields", other)),
        }
    }

    /// Count reply.
    pub fn count(&self, slot: Slot) -> Result<u64> {
        match self.reply(slot)? {
            Reply::Count(n) => Ok(*n),
            other => Err(Self::mismatch(slot, "count", other)),
        }
    }

    /// Flag reply.
    pub fn flag(&self, slot: Slot) -> Result<bool> {
        match self.reply(slot)? {
            Reply::Flag(b) => Ok(*b),
            other => Err(Self::mismatch(slot, "flag", other)),
        }
    }
}
