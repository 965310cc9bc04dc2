//! Live-object registry.
//!
//! The registry is a backend set at a reserved key whose members are
//! the backend keys of all live objects. It is only ever written inside
//! another operation's batch, so an object's registration and its value
//! change atomically and watching the object key alone is sufficient.

use tidepool_core::{BackendKey, Batch, Result, Speculation};

/// Speculative registration probe.
pub(crate) fn is_registered(spec: &dyn Speculation, key: &BackendKey) -> Result<bool> {
    spec.set_contains(BackendKey::registry(), key.as_bytes())
}

/// Stage registration of `key` into `batch`.
pub(crate) fn stage_register(batch: &mut Batch, key: &BackendKey) {
    batch.set_add(BackendKey::registry(), vec![key.as_bytes().to_vec()]);
}

/// Stage removal of `key`'s registration.
pub(crate) fn stage_unregister(batch: &mut Batch, key: &BackendKey) {
    batch.set_remove(BackendKey::registry(), key.as_bytes().to_vec());
}
