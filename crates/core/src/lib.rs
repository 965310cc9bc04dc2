//! # Tidepool Core
//!
//! Protocol layer shared by every Tidepool crate: the backend key
//! scheme, value encoding rules, the error taxonomy, and the optimistic
//! transaction contract.
//!
//! A compound operation runs as one transaction in two typed phases:
//!
//! 1. **Speculation** - the body reads live state through a
//!    [`Speculation`] handle while the driver watches the object's key.
//! 2. **Batch** - the body returns a [`Batch`] of buffered commands.
//!    The driver validates that no watched key changed since the reads,
//!    then applies the batch atomically; on interference it discards the
//!    batch and re-runs the body against fresh state.
//!
//! Commands that produce output hand back a [`Slot`] at buffering time,
//! redeemed against the [`Replies`] of the committed attempt.

#![warn(missing_docs)]

pub mod batch;
pub mod command;
pub mod driver;
pub mod encoding;
pub mod error;
pub mod key;

pub use batch::{Batch, Replies, Slot};
pub use command::{Command, Reply};
pub use driver::{Driver, Speculation};
pub use error::{Error, Result};
pub use key::{BackendKey, Kind, KEY_SEPARATOR};
