//! Convenient imports for Tidepool.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```ignore
//! use tidepool::prelude::*;
//!
//! let pool = Tidepool::memory();
//! let greeting = pool.strings.create("greeting", "hello")?;
//! ```

// Main entry point
pub use crate::store::Tidepool;

// Error handling
pub use tidepool_core::{Error, Result};

// Object factories
pub use crate::objects::{Dicts, Lists, Sets, Strings};

// Object handles
pub use tidepool_collections::{PDict, PList, PSet, PString, SetOperand};

// Backend plumbing
pub use tidepool_core::{Driver, Kind};
pub use tidepool_driver::MemoryDriver;
