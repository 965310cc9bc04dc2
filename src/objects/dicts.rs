//! Mapping object factory.
//!
//! # Example
//!
//! ```ignore
//! use tidepool::prelude::*;
//!
//! let pool = Tidepool::memory();
//!
//! let config = pool.dicts.create("config", [("mode", "fast")])?;
//! config.set_item("level", "3")?;
//! assert_eq!(config.get("mode")?.as_deref(), Some("fast"));
//! ```

use crate::Result;
use std::sync::Arc;
use tidepool_collections::PDict;
use tidepool_core::Driver;

/// Mapping object factory.
///
/// Access via `pool.dicts`.
pub struct Dicts {
    driver: Arc<dyn Driver>,
}

impl Dicts {
    pub(crate) fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Create a new persistent mapping with initial `entries`.
    ///
    /// Fails with `AlreadyExists` when the key is live.
    pub fn create<I, F, V>(&self, key: impl Into<String>, entries: I) -> Result<PDict>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        PDict::from_new(self.driver.clone(), key, entries)
    }

    /// Open an existing persistent mapping.
    ///
    /// Fails with `DoesNotExist` when the key is not live.
    pub fn open(&self, key: impl Into<String>) -> Result<PDict> {
        PDict::from_existing(self.driver.clone(), key)
    }

    /// Bind a handle without checking liveness.
    pub fn bind(&self, key: impl Into<String>) -> PDict {
        PDict::from_raw(self.driver.clone(), key)
    }
}
