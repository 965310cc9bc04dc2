//! Shared object plumbing: key binding and lifecycle transactions.
//!
//! Each handle kind owns its catalog operations; everything an object
//! needs regardless of kind (existence probes, destruction, guarded
//! whole-value writes) lives here on [`ObjectCore`].

use crate::registry;
use std::fmt;
use std::sync::Arc;
use tidepool_core::{BackendKey, Batch, Driver, Error, Kind, Result, Slot, Speculation};

/// Disposition of a whole-value write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Object must not exist; the write registers it.
    Create,
    /// Object must exist; the write replaces its value.
    Replace,
}

/// Driver binding shared by every handle kind.
#[derive(Clone)]
pub(crate) struct ObjectCore {
    driver: Arc<dyn Driver>,
    kind: Kind,
    key: String,
    backend_key: BackendKey,
}

impl ObjectCore {
    pub(crate) fn bind(driver: Arc<dyn Driver>, kind: Kind, key: impl Into<String>) -> Self {
        let key = key.into();
        let backend_key = BackendKey::compose(kind, &key);
        Self {
            driver,
            kind,
            key,
            backend_key,
        }
    }

    pub(crate) fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn backend_key(&self) -> &BackendKey {
        &self.backend_key
    }

    /// Watch list for this object: exactly its own backend key.
    pub(crate) fn watch(&self) -> [BackendKey; 1] {
        [self.backend_key.clone()]
    }

    /// Guard used at the top of every transaction body.
    pub(crate) fn ensure_registered(&self, spec: &dyn Speculation) -> Result<()> {
        if registry::is_registered(spec, &self.backend_key)? {
            Ok(())
        } else {
            Err(self.missing())
        }
    }

    /// The error for operations on an unregistered object.
    pub(crate) fn missing(&self) -> Error {
        Error::DoesNotExist {
            key: self.key.clone(),
        }
    }

    /// One-shot existence probe watching the object key.
    pub(crate) fn exists(&self) -> Result<bool> {
        let mut probe = None;
        let replies = self.driver.transaction(&self.watch(), &mut |_spec| {
            let mut batch = Batch::new();
            probe = Some(batch.set_contains(
                BackendKey::registry(),
                self.backend_key.as_bytes().to_vec(),
            ));
            Ok(batch)
        })?;
        replies.flag(staged(probe)?)
    }

    /// Delete the object's value and registration in one commit.
    ///
    /// With `force`, destroying an absent object is a silent no-op.
    pub(crate) fn destroy(&self, force: bool) -> Result<()> {
        self.driver.transaction(&self.watch(), &mut |spec| {
            let mut batch = Batch::new();
            if !registry::is_registered(spec, &self.backend_key)? {
                if force {
                    // Empty batch: validates the watch, writes nothing.
                    return Ok(batch);
                }
                return Err(self.missing());
            }
            batch.delete(&self.backend_key);
            registry::stage_unregister(&mut batch, &self.backend_key);
            Ok(batch)
        })?;
        tracing::debug!(key = %self.key, kind = %self.kind, "object destroyed");
        Ok(())
    }

    /// Guarded whole-value write. `stage` buffers the kind-specific
    /// payload commands; registration rides in the same batch for
    /// `Create`.
    pub(crate) fn write_value<F>(&self, mode: WriteMode, stage: F) -> Result<()>
    where
        F: Fn(&mut Batch),
    {
        self.driver.transaction(&self.watch(), &mut |spec| {
            let registered = registry::is_registered(spec, &self.backend_key)?;
            let mut batch = Batch::new();
            match mode {
                WriteMode::Create => {
                    if registered {
                        return Err(Error::AlreadyExists {
                            key: self.key.clone(),
                        });
                    }
                    registry::stage_register(&mut batch, &self.backend_key);
                }
                WriteMode::Replace => {
                    if !registered {
                        return Err(self.missing());
                    }
                }
            }
            stage(&mut batch);
            Ok(batch)
        })?;
        if mode == WriteMode::Create {
            tracing::debug!(key = %self.key, kind = %self.kind, "object created");
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCore")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .finish()
    }
}

/// Unwrap a slot captured by a transaction body.
///
/// The body always runs at least once before `transaction` returns
/// `Ok`, so a `None` here is a machinery bug, not a user error.
pub(crate) fn staged(slot: Option<Slot>) -> Result<Slot> {
    slot.ok_or_else(|| Error::Internal("transaction body never ran".to_string()))
}
