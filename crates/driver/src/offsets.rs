//! Inclusive range arithmetic with negative offsets.
//!
//! Backend range reads address elements by possibly-negative offsets:
//! a negative offset counts from the end, the stop is inclusive,
//! out-of-range offsets clamp to the nearest bound, and an inverted
//! range resolves to nothing.

/// Resolve `(start, stop)` against a sequence of `len` elements.
///
/// Returns the inclusive index pair, or `None` when the range resolves
/// empty.
pub(crate) fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    if start < 0 {
        start = 0;
    }
    if stop >= len {
        stop = len - 1;
    }
    if start >= len || stop < 0 || start > stop {
        return None;
    }
    Some((start as usize, stop as usize))
}
