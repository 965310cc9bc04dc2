//! Tidepool entry point.
//!
//! [`Tidepool`] bundles one driver with a factory per collection kind,
//! the way an embedded database exposes its typed primitives over a
//! single engine handle. All factories share the same backend, so
//! objects created through one pool are visible to every other pool
//! (and process) bound to that backend.

use crate::objects::{Dicts, Lists, Sets, Strings};
use std::sync::Arc;
use tidepool_core::Driver;
use tidepool_driver::MemoryDriver;

/// Handle bundling a driver with per-kind object factories.
///
/// # Example
///
/// ```ignore
/// use tidepool::prelude::*;
///
/// let pool = Tidepool::memory();
/// let greeting = pool.strings.create("greeting", "hello")?;
/// greeting.extend(" world")?;
/// assert_eq!(greeting.value()?, "hello world");
/// ```
pub struct Tidepool {
    driver: Arc<dyn Driver>,
    /// String object factory.
    pub strings: Strings,
    /// List object factory.
    pub lists: Lists,
    /// Set object factory.
    pub sets: Sets,
    /// Mapping object factory.
    pub dicts: Dicts,
}

impl Tidepool {
    /// Pool over a fresh in-process [`MemoryDriver`].
    pub fn memory() -> Self {
        Self::with_driver(Arc::new(MemoryDriver::new()))
    }

    /// Pool over any driver implementation.
    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        Self {
            strings: Strings::new(driver.clone()),
            lists: Lists::new(driver.clone()),
            sets: Sets::new(driver.clone()),
            dicts: Dicts::new(driver.clone()),
            driver,
        }
    }

    /// The underlying driver, for sharing one backend across pools.
    pub fn driver(&self) -> Arc<dyn Driver> {
        self.driver.clone()
    }
}

impl std::fmt::Debug for Tidepool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tidepool").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_share_one_backend() {
        let pool = Tidepool::memory();
        pool.strings.create("note", "abc").unwrap();

        let sibling = Tidepool::with_driver(pool.driver());
        let note = sibling.strings.open("note").unwrap();
        assert_eq!(note.value().unwrap(), "abc");
    }

    #[test]
    fn kinds_do_not_collide_on_logical_keys() {
        let pool = Tidepool::memory();
        pool.strings.create("shared", "text").unwrap();
        pool.lists.create("shared", ["a"]).unwrap();
        pool.sets.create("shared", ["m"]).unwrap();
        pool.dicts.create("shared", [("f", "v")]).unwrap();

        assert_eq!(pool.strings.open("shared").unwrap().value().unwrap(), "text");
        assert_eq!(pool.lists.open("shared").unwrap().len().unwrap(), 1);
    }
}
