//! Persistent field-to-value mappings.

use crate::object::{staged, ObjectCore, WriteMode};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tidepool_core::encoding;
use tidepool_core::{Batch, Driver, Error, Kind, Result};

/// Persistent mapping of string fields to string values.
///
/// Absence decisions ride on the commit itself where the backend
/// reports them: deleting a field buffers the delete and reads the
/// removal count back from the committed batch, so the check and the
/// mutation cannot be split by a concurrent writer.
#[derive(Clone)]
pub struct PDict {
    core: ObjectCore,
}

impl PDict {
    /// Create the object with initial `entries`, failing with
    /// [`Error::AlreadyExists`] if the key is live.
    pub fn from_new<I, F, V>(
        driver: Arc<dyn Driver>,
        key: impl Into<String>,
        entries: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        let handle = Self::from_raw(driver, key);
        let encoded = encode_entries(entries);
        let backend_key = handle.core.backend_key().clone();
        handle.core.write_value(WriteMode::Create, move |batch| {
            batch.delete(&backend_key);
            if !encoded.is_empty() {
                batch.hash_put_many(&backend_key, encoded.clone());
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
            core: ObjectCore::bind(driver, Kind::Hash, key),
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

    /// Read all entries.
    pub fn value(&self) -> Result<HashMap<String, String>> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.hash_get_all(key));
            Ok(batch)
        })?;
        let fields = replies.fields(staged(slot)?)?;
        fields
            .iter()
            .map(|(field, value)| {
                Ok((encoding::decode_text(field)?, encoding::decode_text(value)?))
            })
            .collect()
    }

    /// Replace all entries. The object must exist.
    pub fn set_value<I, F, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        let encoded = encode_entries(entries);
        let backend_key = self.core.backend_key().clone();
        self.core.write_value(WriteMode::Replace, move |batch| {
            batch.delete(&backend_key);
            if !encoded.is_empty() {
                batch.hash_put_many(&backend_key, encoded.clone());
            }
        })
    }

    /// Field count.
    pub fn len(&self) -> Result<u64> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.hash_len(key));
            Ok(batch)
        })?;
        replies.count(staged(slot)?)
    }

    /// True when the mapping has no fields.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read one field's value, `None` when the field is absent.
    pub fn get(&self, field: &str) -> Result<Option<String>> {
        let encoded = encoding::encode_text(field);
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.hash_get(key, encoded.clone()));
            Ok(batch)
        })?;
        match replies.maybe_bytes(staged(slot)?)? {
            Some(bytes) => Ok(Some(encoding::decode_text(bytes)?)),
            None => Ok(None),
        }
    }

    /// Field presence probe.
    pub fn contains(&self, field: &str) -> Result<bool> {
        Ok(self.get(field)?.is_some())
    }

    /// Set one field, inserting or overwriting.
    pub fn set_item(&self, field: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let field = encoding::encode_text(&field.into());
        let value = encoding::encode_text(&value.into());
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            batch.hash_put(key, field.clone(), value.clone());
            Ok(batch)
        })?;
        Ok(())
    }

    /// Delete one field, failing with [`Error::KeyNotFound`] when it is
    /// absent. The absence verdict comes from the committed delete's
    /// own count, not a separate probe.
    pub fn del_item(&self, field: &str) -> Result<()> {
        let encoded = encoding::encode_text(field);
        let key = self.core.backend_key();
        let mut deleted = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            deleted = Some(batch.hash_delete(key, encoded.clone()));
            Ok(batch)
        })?;
        if replies.count(staged(deleted)?)? == 0 {
            return Err(Error::KeyNotFound);
        }
        Ok(())
    }

    /// Remove one field and return its value, failing with
    /// [`Error::KeyNotFound`] when it is absent.
    pub fn pop(&self, field: &str) -> Result<String> {
        self.take(field)?.ok_or(Error::KeyNotFound)
    }

    /// Remove one field and return its value, or `default` when the
    /// field is absent.
    pub fn pop_or(&self, field: &str, default: impl Into<String>) -> Result<String> {
        Ok(self.take(field)?.unwrap_or_else(|| default.into()))
    }

    /// Buffered read-then-delete of one field in a single commit.
    fn take(&self, field: &str) -> Result<Option<String>> {
        let encoded = encoding::encode_text(field);
        let key = self.core.backend_key();
        let mut fetched = None;
        let mut deleted = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            fetched = Some(batch.hash_get(key, encoded.clone()));
            deleted = Some(batch.hash_delete(key, encoded.clone()));
            Ok(batch)
        })?;
        if replies.count(staged(deleted)?)? == 0 {
            return Ok(None);
        }
        let bytes = replies
            .maybe_bytes(staged(fetched)?)?
            .ok_or_else(|| Error::Internal("deleted field had no value".to_string()))?;
        Ok(Some(encoding::decode_text(bytes)?))
    }

    /// Remove and return an arbitrary entry, failing with
    /// [`Error::KeyNotFound`] on an empty mapping. Which entry comes
    /// out is explicitly unspecified.
    pub fn popitem(&self) -> Result<(String, String)> {
        let key = self.core.backend_key();
        let mut picked = None;
        let mut deleted = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let all = spec.hash_get_all(key)?;
            let (field, value) = all.into_iter().next().ok_or(Error::KeyNotFound)?;
            let mut batch = Batch::new();
            deleted = Some(batch.hash_delete(key, field.clone()));
            picked = Some((encoding::decode_text(&field)?, encoding::decode_text(&value)?));
            Ok(batch)
        })?;
        if replies.count(staged(deleted)?)? != 1 {
            // The watch promised the picked field was still there.
            return Err(Error::Internal(
                "picked field vanished under watch".to_string(),
            ));
        }
        picked.ok_or_else(|| Error::Internal("transaction body never ran".to_string()))
    }

    /// Remove all fields. The object stays live and reads as empty.
    pub fn clear(&self) -> Result<()> {
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            batch.delete(key);
            Ok(batch)
        })?;
        Ok(())
    }

    /// Merge `entries` into the mapping; incoming values win on
    /// duplicate fields. Runs as a whole-value rewrite even when
    /// `entries` is empty.
    pub fn update<I, F, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        let incoming = encode_entries(entries);
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut merged = spec.hash_get_all(key)?;
            merged.extend(incoming.iter().cloned());
            let mut batch = Batch::new();
            batch.delete(key);
            if !merged.is_empty() {
                batch.hash_put_many(key, merged.into_iter().collect());
            }
            Ok(batch)
        })?;
        Ok(())
    }

    /// Insert `default` under `field` if the field is absent, then
    /// return the live value (pre-existing or just defaulted), all in
    /// one commit.
    pub fn setdefault(&self, field: &str, default: impl Into<String>) -> Result<String> {
        let field_bytes = encoding::encode_text(field);
        let default_bytes = encoding::encode_text(&default.into());
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            let _ = batch.hash_put_if_absent(key, field_bytes.clone(), default_bytes.clone());
            slot = Some(batch.hash_get(key, field_bytes.clone()));
            Ok(batch)
        })?;
        let bytes = replies
            .maybe_bytes(staged(slot)?)?
            .ok_or_else(|| Error::Internal("field absent after set-if-absent".to_string()))?;
        encoding::decode_text(bytes)
    }
}

impl fmt::Debug for PDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PDict").field("key", &self.key()).finish()
    }
}

fn encode_entries<I, F, V>(entries: I) -> Vec<(Vec<u8>, Vec<u8>)>
where
    I: IntoIterator<Item = (F, V)>,
    F: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(field, value)| {
            (
                encoding::encode_text(&field.into()),
                encoding::encode_text(&value.into()),
            )
        })
        .collect()
}
