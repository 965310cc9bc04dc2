//! Persistent item lists.

use crate::object::{staged, ObjectCore, WriteMode};
use crate::seq;
use std::fmt;
use std::sync::Arc;
use tidepool_core::encoding;
use tidepool_core::{Batch, Driver, Error, Kind, Result};

/// Persistent ordered list of string items.
///
/// Mutations run as single optimistic transactions watching the list's
/// backend key. Structural edits (insert, pop, remove, reverse) read
/// the affected spans speculatively, compute the new shape locally, and
/// commit a delete-plus-rewrite; the watch guarantees the spans did not
/// move underneath the rewrite.
#[derive(Clone)]
pub struct PList {
    core: ObjectCore,
}

impl PList {
    /// Create the object with initial `items`, failing with
    /// [`Error::AlreadyExists`] if the key is live.
    pub fn from_new<I, S>(driver: Arc<dyn Driver>, key: impl Into<String>, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handle = Self::from_raw(driver, key);
        let encoded = encode_items(items);
        let backend_key = handle.core.backend_key().clone();
        handle.core.write_value(WriteMode::Create, move |batch| {
            batch.delete(&backend_key);
            if !encoded.is_empty() {
                batch.list_push(&backend_key, encoded.clone());
            }
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
            core: ObjectCore::bind(driver, Kind::List, key),
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

    /// Read all items in order.
    pub fn value(&self) -> Result<Vec<String>> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.list_range(key, 0, -1));
            Ok(batch)
        })?;
        let items = replies.items(staged(slot)?)?;
        items.iter().map(|raw| encoding::decode_text(raw)).collect()
    }

    /// Replace all items. The object must exist.
    pub fn set_value<I, S>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let encoded = encode_items(items);
        let backend_key = self.core.backend_key().clone();
        self.core.write_value(WriteMode::Replace, move |batch| {
            batch.delete(&backend_key);
            if !encoded.is_empty() {
                batch.list_push(&backend_key, encoded.clone());
            }
        })
    }

    /// Item count.
    pub fn len(&self) -> Result<u64> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.list_len(key));
            Ok(batch)
        })?;
        replies.count(staged(slot)?)
    }

    /// True when the list has no items.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Overwrite the item at `index`.
    ///
    /// Negative indexes count from the end; out-of-range indexes fail
    /// with [`Error::IndexOutOfRange`].
    pub fn set_item(&self, index: i64, item: impl Into<String>) -> Result<()> {
        let encoded = encoding::encode_text(&item.into());
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let len = spec.list_len(key)?;
            let at = seq::normalize_index(index, len)?;
            let mut batch = Batch::new();
            batch.list_set(key, at, encoded.clone());
            Ok(batch)
        })?;
        Ok(())
    }

    /// Insert `item` before position `index`.
    ///
    /// Out-of-range positions clamp to the nearest end instead of
    /// failing.
    pub fn insert(&self, index: i64, item: impl Into<String>) -> Result<()> {
        let encoded = encoding::encode_text(&item.into());
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let len = spec.list_len(key)?;
            let at = seq::clamp_insert(index, len);
            let head = if at > 0 {
                spec.list_range(key, 0, at as i64 - 1)?
            } else {
                Vec::new()
            };
            let tail = if at < len {
                spec.list_range(key, at as i64, len as i64)?
            } else {
                Vec::new()
            };
            let mut items = head;
            items.push(encoded.clone());
            items.extend(tail);
            let mut batch = Batch::new();
            batch.delete(key);
            batch.list_push(key, items);
            Ok(batch)
        })?;
        Ok(())
    }

    /// Append one item at the tail.
    pub fn append(&self, item: impl Into<String>) -> Result<()> {
        let encoded = encoding::encode_text(&item.into());
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            batch.list_push(key, vec![encoded.clone()]);
            Ok(batch)
        })?;
        Ok(())
    }

    /// Append several items at the tail, in order. An empty sequence
    /// performs no transaction at all.
    pub fn extend<I, S>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let encoded = encode_items(items);
        if encoded.is_empty() {
            return Ok(());
        }
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            batch.list_push(key, encoded.clone());
            Ok(batch)
        })?;
        Ok(())
    }

    /// Reverse the items in place.
    pub fn reverse(&self) -> Result<()> {
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut items = spec.list_range(key, 0, -1)?;
            items.reverse();
            let mut batch = Batch::new();
            batch.delete(key);
            if !items.is_empty() {
                batch.list_push(key, items);
            }
            Ok(batch)
        })?;
        Ok(())
    }

    /// Remove and return the last item.
    pub fn pop(&self) -> Result<String> {
        self.pop_at(-1)
    }

    /// Remove and return the item at `index`.
    ///
    /// The removed item is captured by a buffered positional read in
    /// the same commit as the rewrite.
    pub fn pop_at(&self, index: i64) -> Result<String> {
        let key = self.core.backend_key();
        let mut removed = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let len = spec.list_len(key)?;
            let at = seq::normalize_index(index, len)?;
            let head = if at > 0 {
                spec.list_range(key, 0, at as i64 - 1)?
            } else {
                Vec::new()
            };
            let tail = if at + 1 < len {
                spec.list_range(key, at as i64 + 1, len as i64)?
            } else {
                Vec::new()
            };
            let mut batch = Batch::new();
            // Capture before the rewrite lands.
            removed = Some(batch.list_index(key, at as i64));
            batch.delete(key);
            let mut rest = head;
            rest.extend(tail);
            if !rest.is_empty() {
                batch.list_push(key, rest);
            }
            Ok(batch)
        })?;
        let item = replies
            .maybe_bytes(staged(removed)?)?
            .ok_or_else(|| Error::Internal("popped position vanished under watch".to_string()))?;
        encoding::decode_text(item)
    }

    /// Remove the first occurrence of `item`, failing with
    /// [`Error::ValueNotFound`] when it is absent.
    pub fn remove(&self, item: &str) -> Result<()> {
        let encoded = encoding::encode_text(item);
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let items = spec.list_range(key, 0, -1)?;
            let at = items
                .iter()
                .position(|candidate| candidate == &encoded)
                .ok_or(Error::ValueNotFound)?;
            let mut rest = items;
            rest.remove(at);
            let mut batch = Batch::new();
            batch.delete(key);
            if !rest.is_empty() {
                batch.list_push(key, rest);
            }
            Ok(batch)
        })?;
        Ok(())
    }
}

impl fmt::Debug for PList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PList").field("key", &self.key()).finish()
    }
}

fn encode_items<I, S>(items: I) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items
        .into_iter()
        .map(|item| encoding::encode_text(&item.into()))
        .collect()
}
