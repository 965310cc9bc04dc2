//! List object factory.
//!
//! # Example
//!
//! ```ignore
//! use tidepool::prelude::*;
//!
//! let pool = Tidepool::memory();
//!
//! let tasks = pool.lists.create("tasks", ["write", "review"])?;
//! tasks.append("merge")?;
//! let done = tasks.pop()?;
//! assert_eq!(done, "merge");
//! ```

use crate::Result;
use std::sync::Arc;
use tidepool_collections::PList;
use tidepool_core::Driver;

/// List object factory.
///
/// Access via `pool.lists`.
pub struct Lists {
    driver: Arc<dyn Driver>,
}

impl Lists {
    pub(crate) fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Create a new persistent list with initial `items`.
    ///
    /// Fails with `AlreadyExists` when the key is live.
    pub fn create<I, S>(&self, key: impl Into<String>, items: I) -> Result<PList>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PList::from_new(self.driver.clone(), key, items)
    }

    /// Open an existing persistent list.
    ///
    /// Fails with `DoesNotExist` when the key is not live.
    pub fn open(&self, key: impl Into<String>) -> Result<PList> {
        PList::from_existing(self.driver.clone(), key)
    }

    /// Bind a handle without checking liveness.
    pub fn bind(&self, key: impl Into<String>) -> PList {
        PList::from_raw(self.driver.clone(), key)
    }
}
