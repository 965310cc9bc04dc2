//! String object factory.
//!
//! # Example
//!
//! ```ignore
//! use tidepool::prelude::*;
//!
//! let pool = Tidepool::memory();
//!
//! let motd = pool.strings.create("motd", "helo")?;
//! motd.insert(3, 'l')?;
//! assert_eq!(motd.value()?, "hello");
//!
//! // Elsewhere, bind to the same object
//! let motd = pool.strings.open("motd")?;
//! motd.extend(" world")?;
//! ```

use crate::Result;
use std::sync::Arc;
use tidepool_collections::PString;
use tidepool_core::Driver;

/// String object factory.
///
/// Access via `pool.strings`.
pub struct Strings {
    driver: Arc<dyn Driver>,
}

impl Strings {
    pub(crate) fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Create a new persistent string.
    ///
    /// Fails with `AlreadyExists` when the key is live.
    pub fn create(&self, key: impl Into<String>, value: &str) -> Result<PString> {
        PString::from_new(self.driver.clone(), key, value)
    }

    /// Open an existing persistent string.
    ///
    /// Fails with `DoesNotExist` when the key is not live.
    pub fn open(&self, key: impl Into<String>) -> Result<PString> {
        PString::from_existing(self.driver.clone(), key)
    }

    /// Bind a handle without checking liveness.
    ///
    /// Operations on the handle still guard existence themselves.
    pub fn bind(&self, key: impl Into<String>) -> PString {
        PString::from_raw(self.driver.clone(), key)
    }
}
