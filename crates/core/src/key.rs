//! Backend key scheme.
//!
//! Every persistent object lives at a backend key composed from its
//! kind prefix and a caller-chosen logical key:
//!
//! ```text
//! <kind-prefix> ":" <logical-key>
//! ```
//!
//! The prefix set is closed and no prefix contains the separator, so
//! the composition is injective per kind even though logical keys may
//! themselves contain `":"`. The registry of live objects sits at a
//! reserved, unprefixed key that can never collide with an object key.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the kind prefix and the logical key.
pub const KEY_SEPARATOR: &str = ":";

/// Reserved backend key holding the set of live object keys.
const REGISTRY_KEY: &str = "_registry";

static REGISTRY: Lazy<BackendKey> = Lazy::new(|| BackendKey(REGISTRY_KEY.to_string()));

/// Storage kind of a persistent object.
///
/// The kind decides both the backend entry layout and the key prefix.
/// Prefixes are part of the storage format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Byte strings with positional access.
    Str,
    /// Ordered item lists.
    List,
    /// Unordered member sets.
    Set,
    /// Field-to-value mappings.
    Hash,
}

impl Kind {
    /// Key prefix for this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            Kind::Str => "string",
            Kind::List => "list",
            Kind::Set => "set",
            Kind::Hash => "hash",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Fully-qualified backend key.
///
/// Object keys always contain the separator; the registry key never
/// does. Registry members are backend keys stored as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendKey(String);

impl BackendKey {
    /// Compose the backend key for `kind` and a logical key.
    pub fn compose(kind: Kind, key: &str) -> Self {
        BackendKey(format!("{}{}{}", kind.prefix(), KEY_SEPARATOR, key))
    }

    /// The reserved registry key.
    pub fn registry() -> &'static BackendKey {
        &REGISTRY
    }

    /// Key text as stored on the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key text as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for BackendKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_stable() {
        assert_eq!(Kind::Str.prefix(), "string");
        assert_eq!(Kind::List.prefix(), "list");
        assert_eq!(Kind::Set.prefix(), "set");
        assert_eq!(Kind::Hash.prefix(), "hash");
    }

    #[test]
    fn compose_joins_prefix_and_key() {
        let key = BackendKey::compose(Kind::List, "tasks");
        assert_eq!(key.as_str(), "list:tasks");
    }

    #[test]
    fn logical_keys_may_contain_separator() {
        let key = BackendKey::compose(Kind::Str, "user:42:name");
        assert_eq!(key.as_str(), "string:user:42:name");
        // The kind segment is still unambiguous.
        assert_eq!(key.as_str().split(':').next(), Some("string"));
    }

    #[test]
    fn same_logical_key_differs_across_kinds() {
        let a = BackendKey::compose(Kind::Set, "shared");
        let b = BackendKey::compose(Kind::Hash, "shared");
        assert_ne!(a, b);
    }

    #[test]
    fn registry_key_is_unprefixed() {
        assert_eq!(BackendKey::registry().as_str(), "_registry");
        assert!(!BackendKey::registry().as_str().contains(KEY_SEPARATOR));
    }
}
