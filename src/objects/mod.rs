//! Per-kind object factories.
//!
//! Each factory holds the pool's driver and turns logical keys into
//! typed handles at one of three binding levels: `create` (new object),
//! `open` (existing object), `bind` (no check).

mod dicts;
mod lists;
mod sets;
mod strings;

pub use dicts::Dicts;
pub use lists::Lists;
pub use sets::Sets;
pub use strings::Strings;
