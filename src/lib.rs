//! # Tidepool
//!
//! Persistent, remotely-stored collections over an optimistic
//! transaction driver.
//!
//! Tidepool keeps strings, lists, sets, and mappings alive in a shared
//! key-value backend. Every compound mutation runs as one
//! watch-validated transaction: read the spans you need, buffer the
//! rewrite, commit only if nobody touched the object in between, retry
//! otherwise. Single-object linearizability without locks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tidepool::prelude::*;
//!
//! let pool = Tidepool::memory();
//!
//! // Create objects through the per-kind factories
//! let tasks = pool.lists.create("tasks", ["write", "review"])?;
//! tasks.append("merge")?;
//! tasks.insert(0, "plan")?;
//!
//! let tags = pool.sets.create("tags", ["rust"])?;
//! tags.add("storage")?;
//!
//! // Handles are cheap bindings; clone them across threads freely
//! let seen = pool.lists.open("tasks")?;
//! assert_eq!(seen.len()?, 4);
//! ```
//!
//! ## Progressive Disclosure
//!
//! Each factory exposes three binding levels:
//!
//! 1. **Create** - new object, fails if live: `pool.lists.create(...)`
//! 2. **Open** - existing object, fails if absent: `pool.lists.open(...)`
//! 3. **Bind** - no check at all: `pool.lists.bind(...)`
//!
//! ## Kinds
//!
//! - [`PString`] - ASCII character strings with positional edits
//! - [`PList`] - ordered item lists
//! - [`PSet`] - unordered member sets with in-place algebra
//! - [`PDict`] - field-to-value mappings

#![warn(missing_docs)]

mod objects;
mod store;

pub mod prelude;

// Re-export main entry points
pub use objects::{Dicts, Lists, Sets, Strings};
pub use store::Tidepool;

// Re-export the protocol surface for custom drivers
pub use tidepool_core::{
    encoding, BackendKey, Batch, Command, Driver, Error, Kind, Replies, Reply, Result, Slot,
    Speculation, KEY_SEPARATOR,
};

// Re-export the collection handles
pub use tidepool_collections::{PDict, PList, PSet, PString, SetOperand};

// Re-export the bundled backend
pub use tidepool_driver::MemoryDriver;
