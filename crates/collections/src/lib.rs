//! # Tidepool Collections
//!
//! Typed handles over persistent, remotely-stored collections:
//! [`PString`], [`PList`], [`PSet`], and [`PDict`].
//!
//! Every compound mutation compiles to a single optimistic transaction
//! watching the object's backend key: speculative reads feed local
//! computation, buffered commands carry the write intents, and the
//! driver retries the whole body when a concurrent writer invalidates
//! the watch. Failed operations never leave partial writes behind.
//!
//! Object existence lives in a registry set, staged in the same batch
//! as the value it describes, so an empty collection is a real, live
//! object and watching the object key alone covers its lifecycle.

#![warn(missing_docs)]

mod dict;
mod list;
mod object;
mod registry;
mod seq;
mod set;
mod string;

pub use dict::PDict;
pub use list::PList;
pub use set::{PSet, SetOperand};
pub use string::PString;
