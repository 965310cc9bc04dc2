//! Set object factory.
//!
//! # Example
//!
//! ```ignore
//! use tidepool::prelude::*;
//!
//! let pool = Tidepool::memory();
//!
//! let tags = pool.sets.create("tags", ["rust", "storage"])?;
//! tags.add("kv")?;
//! assert!(tags.contains("kv")?);
//! ```

use crate::Result;
use std::sync::Arc;
use tidepool_collections::PSet;
use tidepool_core::Driver;

/// Set object factory.
///
/// Access via `pool.sets`.
pub struct Sets {
    driver: Arc<dyn Driver>,
}

impl Sets {
    pub(crate) fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Create a new persistent set with initial `members`.
    ///
    /// Fails with `AlreadyExists` when the key is live.
    pub fn create<I, S>(&self, key: impl Into<String>, members: I) -> Result<PSet>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PSet::from_new(self.driver.clone(), key, members)
    }

    /// Open an existing persistent set.
    ///
    /// Fails with `DoesNotExist` when the key is not live.
    pub fn open(&self, key: impl Into<String>) -> Result<PSet> {
        PSet::from_existing(self.driver.clone(), key)
    }

    /// Bind a handle without checking liveness.
    pub fn bind(&self, key: impl Into<String>) -> PSet {
        PSet::from_raw(self.driver.clone(), key)
    }
}
