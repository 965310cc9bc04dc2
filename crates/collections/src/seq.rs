//! Index arithmetic shared by the sequence kinds.
//!
//! Positional operations accept negative indexes counted from the end.
//! Lookups fail outside the live bounds; insert positions clamp to the
//! nearest end instead.

use tidepool_core::{Error, Result};

/// Resolve a possibly-negative index against `len`, failing with
/// [`Error::IndexOutOfRange`] outside `[0, len)`.
pub(crate) fn normalize_index(index: i64, len: u64) -> Result<u64> {
    let len_i = len as i64;
    let resolved = if index < 0 { len_i + index } else { index };
    if resolved < 0 || resolved >= len_i {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(resolved as u64)
}

/// Clamp an insert position into `[0, len]`.
pub(crate) fn clamp_insert(index: i64, len: u64) -> u64 {
    let len_i = len as i64;
    let resolved = if index < 0 { len_i + index } else { index };
    resolved.clamp(0, len_i) as u64
}
