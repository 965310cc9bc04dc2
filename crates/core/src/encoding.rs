//! Value encoding between catalog types and backend byte strings.
//!
//! The backend stores raw bytes. Character items and whole string
//! values are restricted to ASCII so the byte offsets used by
//! positional operations line up with character indexes. List items,
//! set members, and mapping fields/values are arbitrary UTF-8.

use crate::error::{Error, Result};

/// Encode a single string character.
///
/// Non-ASCII input is rejected up front, before any transaction runs.
pub fn encode_char(c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(Error::TypeRejected {
            reason: format!("non-ASCII character {:?}", c),
        })
    }
}

/// Encode a whole string value. Same ASCII restriction as
/// [`encode_char`].
pub fn encode_ascii(s: &str) -> Result<Vec<u8>> {
    if s.is_ascii() {
        Ok(s.as_bytes().to_vec())
    } else {
        Err(Error::TypeRejected {
            reason: format!("non-ASCII string {:?}", s),
        })
    }
}

/// Encode a list item, set member, mapping field, or mapping value.
pub fn encode_text(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

/// Decode backend bytes as UTF-8 text.
///
/// Fails only when a foreign writer stored non-UTF-8 bytes; nothing
/// written through this crate can trip it.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::TypeRejected {
        reason: "stored bytes are not valid UTF-8".to_string(),
    })
}

/// Decode a single stored byte back to its character.
pub fn decode_char(bytes: &[u8]) -> Result<char> {
    match bytes {
        [b] if b.is_ascii() => Ok(*b as char),
        _ => Err(Error::TypeRejected {
            reason: format!("expected one ASCII byte, got {} bytes", bytes.len()),
        }),
    }
}
