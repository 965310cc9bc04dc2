//! Stored entries.
//!
//! The entry kind is fixed by the first write to a key and checked by
//! every later command. Kind mismatches cannot arise through the
//! collection catalog (each key carries its kind in its prefix); they
//! signal a foreign writer on the same backend.

use rustc_hash::{FxHashMap, FxHashSet};
use tidepool_core::{Error, Result};

/// One stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entry {
    Str(Vec<u8>),
    List(Vec<Vec<u8>>),
    Set(FxHashSet<Vec<u8>>),
    Hash(FxHashMap<Vec<u8>, Vec<u8>>),
}

impl Entry {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Entry::Str(_) => "string",
            Entry::List(_) => "list",
            Entry::Set(_) => "set",
            Entry::Hash(_) => "hash",
        }
    }

    fn wrong_kind(&self, expected: &'static str) -> Error {
        Error::WrongKind {
            expected,
            actual: self.kind_name(),
        }
    }

    pub(crate) fn as_str(&self) -> Result<&Vec<u8>> {
        match self {
            Entry::Str(bytes) => Ok(bytes),
            other => Err(other.wrong_kind("string")),
        }
    }

    pub(crate) fn as_str_mut(&mut self) -> Result<&mut Vec<u8>> {
        match self {
            Entry::Str(bytes) => Ok(bytes),
            other => Err(other.wrong_kind("string")),
        }
    }

    pub(crate) fn as_list(&self) -> Result<&Vec<Vec<u8>>> {
        match self {
            Entry::List(items) => Ok(items),
            other => Err(other.wrong_kind("list")),
        }
    }

    pub(crate) fn as_list_mut(&mut self) -> Result<&mut Vec<Vec<u8>>> {
        match self {
            Entry::List(items) => Ok(items),
            other => Err(other.wrong_kind("list")),
        }
    }

    pub(crate) fn as_set(&self) -> Result<&FxHashSet<Vec<u8>>> {
        match self {
            Entry::Set(members) => Ok(members),
            other => Err(other.wrong_kind("set")),
        }
    }

    pub(crate) fn as_set_mut(&mut self) -> Result<&mut FxHashSet<Vec<u8>>> {
        match self {
            Entry::Set(members) => Ok(members),
            other => Err(other.wrong_kind("set")),
        }
    }

    pub(crate) fn as_hash(&self) -> Result<&FxHashMap<Vec<u8>, Vec<u8>>> {
        match self {
            Entry::Hash(fields) => Ok(fields),
            other => Err(other.wrong_kind("hash")),
        }
    }

    pub(crate) fn as_hash_mut(&mut self) -> Result<&mut FxHashMap<Vec<u8>, Vec<u8>>> {
        match self {
            Entry::Hash(fields) => Ok(fields),
            other => Err(other.wrong_kind("hash")),
        }
    }
}
