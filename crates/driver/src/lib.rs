//! # Tidepool Driver
//!
//! In-process implementation of the Tidepool transaction contract.
//!
//! [`MemoryDriver`] keeps entries in concurrent maps with a version per
//! key. A transaction snapshots the watched versions, runs its body
//! against live state, then validates and applies under a commit lock.
//! See the `memory` module docs for the concurrency design.

#![warn(missing_docs)]

mod entry;
mod memory;
mod offsets;

pub use memory::MemoryDriver;
