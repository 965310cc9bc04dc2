//! Buffered commands and their replies.
//!
//! A [`Command`] is a write intent or commit-time read queued into a
//! [`Batch`](crate::batch::Batch). Commands execute only after watch
//! validation, in batch order; later commands observe the effects of
//! earlier ones in the same batch.
//!
//! Range offsets follow backend conventions: negative offsets count
//! from the end, stops are inclusive, out-of-range offsets clamp, and
//! an inverted range is empty.

use crate::key::BackendKey;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One buffered backend command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    // ------------------------------------------------------------------
    // Any kind
    // ------------------------------------------------------------------
    /// Remove the key outright. Registration is not touched; staging
    /// that is the caller's job.
    Delete(BackendKey),

    // ------------------------------------------------------------------
    // String kind
    // ------------------------------------------------------------------
    /// Overwrite the whole byte string.
    Set(BackendKey, Vec<u8>),
    /// Append bytes to the end, creating the key if missing.
    Append(BackendKey, Vec<u8>),
    /// Overwrite bytes starting at a non-negative offset, zero-padding
    /// any gap past the current end.
    SetRange(BackendKey, u64, Vec<u8>),
    /// Read the whole byte string. Reply: [`Reply::MaybeBytes`].
    Get(BackendKey),
    /// Read an inclusive byte range. Reply: [`Reply::Bytes`] (empty
    /// when the key is missing or the range resolves empty).
    GetRange(BackendKey, i64, i64),
    /// Byte length, zero when missing. Reply: [`Reply::Count`].
    StrLen(BackendKey),

    // ------------------------------------------------------------------
    // List kind
    // ------------------------------------------------------------------
    /// Append items at the tail, creating the key if missing.
    ListPush(BackendKey, Vec<Vec<u8>>),
    /// Overwrite the item at a non-negative, in-bounds position.
    ListSet(BackendKey, u64, Vec<u8>),
    /// Read the item at a position. Reply: [`Reply::MaybeBytes`]
    /// (`None` when missing or out of range).
    ListIndex(BackendKey, i64),
    /// Read an inclusive item range. Reply: [`Reply::Items`].
    ListRange(BackendKey, i64, i64),
    /// Item count, zero when missing. Reply: [`Reply::Count`].
    ListLen(BackendKey),

    // ------------------------------------------------------------------
    // Set kind
    // ------------------------------------------------------------------
    /// Add members, creating the key if missing.
    SetAdd(BackendKey, Vec<Vec<u8>>),
    /// Remove one member; absent members are ignored.
    SetRemove(BackendKey, Vec<u8>),
    /// Remove and return an arbitrary member. Reply:
    /// [`Reply::MaybeBytes`] (`None` when the set is empty or missing).
    SetPop(BackendKey),
    /// Read all members. Reply: [`Reply::Members`].
    SetMembers(BackendKey),
    /// Membership probe. Reply: [`Reply::Flag`].
    SetContains(BackendKey, Vec<u8>),
    /// Member count, zero when missing. Reply: [`Reply::Count`].
    SetLen(BackendKey),

    // ------------------------------------------------------------------
    // Hash kind
    // ------------------------------------------------------------------
    /// Set one field, creating the key if missing.
    HashPut(BackendKey, Vec<u8>, Vec<u8>),
    /// Set many fields at once; later pairs win on duplicate fields.
    HashPutMany(BackendKey, Vec<(Vec<u8>, Vec<u8>)>),
    /// Set one field only if it is absent. Reply: [`Reply::Flag`]
    /// (`true` when the write happened).
    HashPutIfAbsent(BackendKey, Vec<u8>, Vec<u8>),
    /// Read one field. Reply: [`Reply::MaybeBytes`].
    HashGet(BackendKey, Vec<u8>),
    /// Read all fields. Reply: [`Reply::Fields`].
    HashGetAll(BackendKey),
    /// Delete one field if present. Reply: [`Reply::Count`] (number of
    /// fields removed, 0 or 1).
    HashDelete(BackendKey, Vec<u8>),
    /// Field count, zero when missing. Reply: [`Reply::Count`].
    HashLen(BackendKey),
}

impl Command {
    /// Key this command addresses.
    pub fn key(&self) -> &BackendKey {
        match self {
            Command::Delete(key)
            | Command::Set(key, _)
            | Command::Append(key, _)
            | Command::SetRange(key, _, _)
            | Command::Get(key)
            | Command::GetRange(key, _, _)
            | Command::StrLen(key)
            | Command::ListPush(key, _)
            | Command::ListSet(key, _, _)
            | Command::ListIndex(key, _)
            | Command::ListRange(key, _, _)
            | Command::ListLen(key)
            | Command::SetAdd(key, _)
            | Command::SetRemove(key, _)
            | Command::SetPop(key)
            | Command::SetMembers(key)
            | Command::SetContains(key, _)
            | Command::SetLen(key)
            | Command::HashPut(key, _, _)
            | Command::HashPutMany(key, _)
            | Command::HashPutIfAbsent(key, _, _)
            | Command::HashGet(key, _)
            | Command::HashGetAll(key)
            | Command::HashDelete(key, _)
            | Command::HashLen(key) => key,
        }
    }

    /// True when the command may change stored state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Delete(_)
                | Command::Set(_, _)
                | Command::Append(_, _)
                | Command::SetRange(_, _, _)
                | Command::ListPush(_, _)
                | Command::ListSet(_, _, _)
                | Command::SetAdd(_, _)
                | Command::SetRemove(_, _)
                | Command::SetPop(_)
                | Command::HashPut(_, _, _)
                | Command::HashPutMany(_, _)
                | Command::HashPutIfAbsent(_, _, _)
                | Command::HashDelete(_, _)
        )
    }
}

/// Reply produced by one buffered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Write acknowledged; no payload.
    Unit,
    /// Byte payload; missing keys read as empty.
    Bytes(Vec<u8>),
    /// Optional byte payload for point reads of possibly-absent values.
    MaybeBytes(Option<Vec<u8>>),
    /// Ordered items from a list read.
    Items(Vec<Vec<u8>>),
    /// Unordered members from a set read.
    Members(HashSet<Vec<u8>>),
    /// Field-to-value pairs from a hash read.
    Fields(HashMap<Vec<u8>, Vec<u8>>),
    /// Count reply: lengths and delete tallies.
    Count(u64),
    /// Yes/no probe reply.
    Flag(bool),
}

impl Reply {
    /// Short label for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Reply::Unit => "unit",
            Reply::Bytes(_) => "bytes",
            Reply::MaybeBytes(_) => "maybe-bytes",
            Reply::Items(_) => "items",
            Reply::Members(_) => "members",
            Reply::Fields(_) => "fields",
            Reply::Count(_) => "count",
            Reply::Flag(_) => "flag",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Kind;

    #[test]
    fn command_reports_its_key() {
        let key = BackendKey::compose(Kind::List, "jobs");
        let cmd = Command::ListPush(key.clone(), vec![b"a".to_vec()]);
        assert_eq!(cmd.key(), &key);
    }

    #[test]
    fn write_classification() {
        let key = BackendKey::compose(Kind::Hash, "h");
        assert!(Command::HashDelete(key.clone(), b"f".to_vec()).is_write());
        assert!(Command::SetPop(BackendKey::compose(Kind::Set, "s")).is_write());
        assert!(!Command::HashGetAll(key.clone()).is_write());
        assert!(!Command::StrLen(BackendKey::compose(Kind::Str, "s")).is_write());
    }

    #[test]
    fn reply_labels() {
        assert_eq!(Reply::Unit.label(), "unit");
        assert_eq!(Reply::Count(3).label(), "count");
        assert_eq!(Reply::MaybeBytes(None).label(), "maybe-bytes");
    }
}
