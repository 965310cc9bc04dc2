//! Persistent character strings.

use crate::object::{staged, ObjectCore, WriteMode};
use crate::seq;
use std::fmt;
use std::sync::Arc;
use tidepool_core::encoding;
use tidepool_core::{Batch, Driver, Error, Kind, Result};

/// Persistent string of ASCII characters.
///
/// Handles are cheap bindings of a driver to one logical key; cloning a
/// handle clones the binding, not the value. Every mutation runs as one
/// optimistic transaction watching the string's backend key, so
/// concurrent writers serialize by first-committer-wins and a failed
/// operation leaves the stored value untouched.
///
/// Items are single characters. Positional operations address byte
/// offsets, which is why non-ASCII input is rejected up front with
/// [`Error::TypeRejected`] rather than silently misaligning indexes.
///
/// # Example
///
/// ```ignore
/// let s = PString::from_new(driver, "motd", "helo")?;
/// s.insert(3, 'l')?;
/// assert_eq!(s.value()?, "hello");
/// ```
#[derive(Clone)]
pub struct PString {
    core: ObjectCore,
}

impl PString {
    /// Create the object, failing with [`Error::AlreadyExists`] if the
    /// key is live. Registration and the initial value land in one
    /// commit.
    pub fn from_new(driver: Arc<dyn Driver>, key: impl Into<String>, value: &str) -> Result<Self> {
        let handle = Self::from_raw(driver, key);
        let encoded = encoding::encode_ascii(value)?;
        let backend_key = handle.core.backend_key().clone();
        handle.core.write_value(WriteMode::Create, move |batch| {
            batch.set(&backend_key, encoded.clone());
        })?;
        Ok(handle)
    }

    /// Bind to an existing object, failing with
    /// [`Error::DoesNotExist`] if the key is not live.
    pub fn from_existing(driver: Arc<dyn Driver>, key: impl Into<String>) -> Result<Self> {
        let handle = Self::from_raw(driver, key);
        if handle.exists()? {
            Ok(handle)
        } else {
            Err(handle.core.missing())
        }
    }

    /// Bind without checking liveness.
    pub fn from_raw(driver: Arc<dyn Driver>, key: impl Into<String>) -> Self {
        Self {
            core: ObjectCore::bind(driver, Kind::Str, key),
        }
    }

    /// Logical key this handle is bound to.
    pub fn key(&self) -> &str {
        self.core.key()
    }

    /// Whether the object is currently live.
    pub fn exists(&self) -> Result<bool> {
        self.core.exists()
    }

    /// Delete the object. With `force`, deleting an absent object
    /// succeeds silently.
    pub fn destroy(&self, force: bool) -> Result<()> {
        self.core.destroy(force)
    }

    /// Read the whole value.
    pub fn value(&self) -> Result<String> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.get(key));
            Ok(batch)
        })?;
        let bytes = replies.maybe_bytes(staged(slot)?)?.unwrap_or_default();
        encoding::decode_text(bytes)
    }

    /// Replace the whole value. The object must exist.
    pub fn set_value(&self, value: &str) -> Result<()> {
        let encoded = encoding::encode_ascii(value)?;
        let backend_key = self.core.backend_key().clone();
        self.core.write_value(WriteMode::Replace, move |batch| {
            batch.set(&backend_key, encoded.clone());
        })
    }

    /// Character count.
    pub fn len(&self) -> Result<u64> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.str_len(key));
            Ok(batch)
        })?;
        replies.count(staged(slot)?)
    }

    /// True when the string has no characters.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Overwrite the character at `index`.
    ///
    /// Negative indexes count from the end; out-of-range indexes fail
    /// with [`Error::IndexOutOfRange`].
    pub fn set_item(&self, index: i64, item: char) -> Result<()> {
        let byte = encoding::encode_char(item)?;
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let len = spec.str_len(key)?;
            let at = seq::normalize_index(index, len)?;
            let mut batch = Batch::new();
            batch.set_range(key, at, vec![byte]);
            Ok(batch)
        })?;
        Ok(())
    }

    /// Insert `item` before position `index`.
    ///
    /// Out-of-range positions clamp to the nearest end instead of
    /// failing, so inserts never raise [`Error::IndexOutOfRange`].
    pub fn insert(&self, index: i64, item: char) -> Result<()> {
        let byte = encoding::encode_char(item)?;
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let len = spec.str_len(key)?;
            let at = seq::clamp_insert(index, len);
            let head = if at > 0 {
                spec.str_range(key, 0, at as i64 - 1)?
            } else {
                Vec::new()
            };
            let tail = if at < len {
                spec.str_range(key, at as i64, len as i64)?
            } else {
                Vec::new()
            };
            let mut value = head;
            value.push(byte);
            value.extend_from_slice(&tail);
            let mut batch = Batch::new();
            batch.set(key, value);
            Ok(batch)
        })?;
        Ok(())
    }

    /// Append one character.
    pub fn append(&self, item: char) -> Result<()> {
        let byte = encoding::encode_char(item)?;
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            batch.append(key, vec![byte]);
            Ok(batch)
        })?;
        Ok(())
    }

    /// Append a whole suffix. An empty suffix performs no transaction
    /// at all.
    pub fn extend(&self, suffix: &str) -> Result<()> {
        if suffix.is_empty() {
            return Ok(());
        }
        let encoded = encoding::encode_ascii(suffix)?;
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            batch.append(key, encoded.clone());
            Ok(batch)
        })?;
        Ok(())
    }

    /// Reverse the characters in place.
    pub fn reverse(&self) -> Result<()> {
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut value = spec.str_get(key)?;
            value.reverse();
            let mut batch = Batch::new();
            batch.set(key, value);
            Ok(batch)
        })?;
        Ok(())
    }

    /// Remove and return the last character.
    pub fn pop(&self) -> Result<char> {
        self.pop_at(-1)
    }

    /// Remove and return the character at `index`.
    ///
    /// The removed character is captured by a buffered positional read
    /// in the same commit as the rewrite, so the returned value is
    /// exactly what concurrent readers last saw at that position.
    pub fn pop_at(&self, index: i64) -> Result<char> {
        let key = self.core.backend_key();
        let mut removed = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let len = spec.str_len(key)?;
            let at = seq::normalize_index(index, len)?;
            let head = if at > 0 {
                spec.str_range(key, 0, at as i64 - 1)?
            } else {
                Vec::new()
            };
            let tail = if at + 1 < len {
                spec.str_range(key, at as i64 + 1, len as i64)?
            } else {
                Vec::new()
            };
            let mut batch = Batch::new();
            // Capture before the rewrite lands.
            removed = Some(batch.get_range(key, at as i64, at as i64));
            let mut value = head;
            value.extend_from_slice(&tail);
            batch.set(key, value);
            Ok(batch)
        })?;
        let bytes = replies.bytes(staged(removed)?)?;
        encoding::decode_char(bytes)
    }

    /// Remove the first occurrence of `item`, failing with
    /// [`Error::ValueNotFound`] when the character is absent.
    pub fn remove(&self, item: char) -> Result<()> {
        let byte = encoding::encode_char(item)?;
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let value = spec.str_get(key)?;
            let at = value
                .iter()
                .position(|b| *b == byte)
                .ok_or(Error::ValueNotFound)?;
            let mut next = value;
            next.remove(at);
            let mut batch = Batch::new();
            batch.set(key, next);
            Ok(batch)
        })?;
        Ok(())
    }
}

impl fmt::Debug for PString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PString").field("key", &self.key()).finish()
    }
}
