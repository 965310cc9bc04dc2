//! Persistent member sets.

use crate::object::{staged, ObjectCore, WriteMode};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tidepool_core::encoding;
use tidepool_core::{Batch, Driver, Error, Kind, Result};

/// Operand of a set-algebra update.
///
/// Anything that can materialize a member snapshot works. A [`PSet`]
/// operand reads its members in a separate transaction before the
/// update begins: two objects are never watched together, so
/// cross-object algebra sees a snapshot, not a joint commit.
pub trait SetOperand {
    /// Materialize the operand's members.
    fn materialize(&self) -> Result<HashSet<String>>;
}

impl SetOperand for HashSet<String> {
    fn materialize(&self) -> Result<HashSet<String>> {
        Ok(self.clone())
    }
}

impl SetOperand for [&str] {
    fn materialize(&self) -> Result<HashSet<String>> {
        Ok(self.iter().map(|member| member.to_string()).collect())
    }
}

impl SetOperand for PSet {
    fn materialize(&self) -> Result<HashSet<String>> {
        self.value()
    }
}

/// Persistent unordered set of string members.
///
/// Algebra updates read the current members speculatively, compute the
/// result locally, and commit a delete-plus-re-add of the result; the
/// watch guarantees the membership did not change underneath.
#[derive(Clone)]
pub struct PSet {
    core: ObjectCore,
}

impl PSet {
    /// Create the object with initial `members`, failing with
    /// [`Error::AlreadyExists`] if the key is live.
    pub fn from_new<I, S>(
        driver: Arc<dyn Driver>,
        key: impl Into<String>,
        members: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handle = Self::from_raw(driver, key);
        let encoded: Vec<Vec<u8>> = members
            .into_iter()
            .map(|member| encoding::encode_text(&member.into()))
            .collect();
        let backend_key = handle.core.backend_key().clone();
        handle.core.write_value(WriteMode::Create, move |batch| {
            batch.delete(&backend_key);
            if !encoded.is_empty() {
                batch.set_add(&backend_key, encoded.clone());
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
            core: ObjectCore::bind(driver, Kind::Set, key),
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

    /// Read all members.
    pub fn value(&self) -> Result<HashSet<String>> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.set_members(key));
            Ok(batch)
        })?;
        let members = replies.members(staged(slot)?)?;
        members
            .iter()
            .map(|member| encoding::decode_text(member))
            .collect()
    }

    /// Replace all members. The object must exist.
    pub fn set_value<I, S>(&self, members: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let encoded: Vec<Vec<u8>> = members
            .into_iter()
            .map(|member| encoding::encode_text(&member.into()))
            .collect();
        let backend_key = self.core.backend_key().clone();
        self.core.write_value(WriteMode::Replace, move |batch| {
            batch.delete(&backend_key);
            if !encoded.is_empty() {
                batch.set_add(&backend_key, encoded.clone());
            }
        })
    }

    /// Member count.
    pub fn len(&self) -> Result<u64> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.set_len(key));
            Ok(batch)
        })?;
        replies.count(staged(slot)?)
    }

    /// True when the set has no members.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Membership probe.
    pub fn contains(&self, member: &str) -> Result<bool> {
        let encoded = encoding::encode_text(member);
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.set_contains(key, encoded.clone()));
            Ok(batch)
        })?;
        replies.flag(staged(slot)?)
    }

    /// Add one member. Adding a present member is a no-op that still
    /// commits.
    pub fn add(&self, member: impl Into<String>) -> Result<()> {
        let encoded = encoding::encode_text(&member.into());
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            batch.set_add(key, vec![encoded.clone()]);
            Ok(batch)
        })?;
        Ok(())
    }

    /// Remove one member if present; absent members are ignored.
    pub fn discard(&self, member: &str) -> Result<()> {
        let encoded = encoding::encode_text(member);
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            batch.set_remove(key, encoded.clone());
            Ok(batch)
        })?;
        Ok(())
    }

    /// Remove one member, failing with [`Error::KeyNotFound`] when it
    /// is absent. The failed case writes nothing.
    pub fn remove(&self, member: &str) -> Result<()> {
        let encoded = encoding::encode_text(member);
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            if !spec.set_contains(key, &encoded)? {
                return Err(Error::KeyNotFound);
            }
            let mut batch = Batch::new();
            batch.set_remove(key, encoded.clone());
            Ok(batch)
        })?;
        Ok(())
    }

    /// Remove and return an arbitrary member, failing with
    /// [`Error::KeyNotFound`] on an empty set. Which member comes out
    /// is explicitly unspecified.
    pub fn pop(&self) -> Result<String> {
        let key = self.core.backend_key();
        let mut slot = None;
        let replies = self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let mut batch = Batch::new();
            slot = Some(batch.set_pop(key));
            Ok(batch)
        })?;
        let member = replies
            .maybe_bytes(staged(slot)?)?
            .ok_or(Error::KeyNotFound)?;
        encoding::decode_text(member)
    }

    /// Remove all members. The object stays live and reads as empty.
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

    /// Keep every member of self plus every member of `operand`.
    pub fn union_with<O>(&self, operand: &O) -> Result<()>
    where
        O: SetOperand + ?Sized,
    {
        let other = operand.materialize()?;
        self.update_members(&other, |current, other| {
            current.union(other).cloned().collect()
        })
    }

    /// Keep only members present in both self and `operand`.
    pub fn intersect_with<O>(&self, operand: &O) -> Result<()>
    where
        O: SetOperand + ?Sized,
    {
        let other = operand.materialize()?;
        self.update_members(&other, |current, other| {
            current.intersection(other).cloned().collect()
        })
    }

    /// Drop every member that `operand` contains.
    pub fn difference_with<O>(&self, operand: &O) -> Result<()>
    where
        O: SetOperand + ?Sized,
    {
        let other = operand.materialize()?;
        self.update_members(&other, |current, other| {
            current.difference(other).cloned().collect()
        })
    }

    /// Keep members present in exactly one of self and `operand`.
    pub fn symmetric_difference_with<O>(&self, operand: &O) -> Result<()>
    where
        O: SetOperand + ?Sized,
    {
        let other = operand.materialize()?;
        self.update_members(&other, |current, other| {
            current.symmetric_difference(other).cloned().collect()
        })
    }

    /// Shared shape of the four algebra updates: read current members,
    /// merge locally, rewrite the whole set.
    fn update_members<F>(&self, operand: &HashSet<String>, merge: F) -> Result<()>
    where
        F: Fn(&HashSet<String>, &HashSet<String>) -> HashSet<String>,
    {
        let key = self.core.backend_key();
        self.core.driver().transaction(&self.core.watch(), &mut |spec| {
            self.core.ensure_registered(spec)?;
            let current = decode_members(&spec.set_members(key)?)?;
            let next = merge(&current, operand);
            let mut batch = Batch::new();
            batch.delete(key);
            if !next.is_empty() {
                batch.set_add(
                    key,
                    next.iter().map(|member| encoding::encode_text(member)).collect(),
                );
            }
            Ok(batch)
        })?;
        Ok(())
    }
}

impl fmt::Debug for PSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PSet").field("key", &self.key()).finish()
    }
}

fn decode_members(raw: &HashSet<Vec<u8>>) -> Result<HashSet<String>> {
    raw.iter().map(|member| encoding::decode_text(member)).collect()
}
