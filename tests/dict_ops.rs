//! Mapping Object Operations Tests
//!
//! Exercises field reads, removals, merges, and setdefault on `PDict`
//! handles.

use std::collections::HashMap;
use tidepool::prelude::*;

fn pool() -> Tidepool {
    Tidepool::memory()
}

fn map_of(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(f, v)| (f.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// VALUE READ / WRITE
// =============================================================================

#[test]
fn test_create_and_read_entries() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("mode", "fast")]).unwrap();
    assert_eq!(d.value().unwrap(), map_of(&[("mode", "fast")]));
    assert_eq!(d.len().unwrap(), 1);
}

#[test]
fn test_create_empty_dict_is_live() {
    let pool = pool();
    let d = pool
        .dicts
        .create("cfg", Vec::<(String, String)>::new())
        .unwrap();
    assert!(d.exists().unwrap());
    assert!(d.is_empty().unwrap());
}

#[test]
fn test_create_last_duplicate_field_wins() {
    let pool = pool();
    let d = pool
        .dicts
        .create("cfg", [("k", "first"), ("k", "second")])
        .unwrap();
    assert_eq!(d.get("k").unwrap().as_deref(), Some("second"));
    assert_eq!(d.len().unwrap(), 1);
}

#[test]
fn test_set_value_replaces_entries() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    d.set_value([("x", "9"), ("y", "8")]).unwrap();
    assert_eq!(d.value().unwrap(), map_of(&[("x", "9"), ("y", "8")]));
}

#[test]
fn test_fields_keep_unicode() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("名前", "値")]).unwrap();
    assert_eq!(d.get("名前").unwrap().as_deref(), Some("値"));
}

// =============================================================================
// GET / CONTAINS / SET ITEM
// =============================================================================

#[test]
fn test_get_absent_field_is_none() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    assert_eq!(d.get("missing").unwrap(), None);
}

#[test]
fn test_contains() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    assert!(d.contains("a").unwrap());
    assert!(!d.contains("b").unwrap());
}

#[test]
fn test_set_item_inserts_new_field() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    d.set_item("b", "2").unwrap();
    assert_eq!(d.value().unwrap(), map_of(&[("a", "1"), ("b", "2")]));
}

#[test]
fn test_set_item_overwrites_existing_field() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    d.set_item("a", "9").unwrap();
    assert_eq!(d.get("a").unwrap().as_deref(), Some("9"));
    assert_eq!(d.len().unwrap(), 1);
}

// =============================================================================
// DEL ITEM / POP
// =============================================================================

#[test]
fn test_del_item_removes_field() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1"), ("b", "2")]).unwrap();
    d.del_item("a").unwrap();
    assert_eq!(d.value().unwrap(), map_of(&[("b", "2")]));
}

#[test]
fn test_del_item_absent_field_fails() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    assert!(matches!(d.del_item("z").unwrap_err(), Error::KeyNotFound));
    assert_eq!(d.len().unwrap(), 1);
}

#[test]
fn test_pop_returns_and_removes() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1"), ("b", "2")]).unwrap();
    assert_eq!(d.pop("a").unwrap(), "1");
    assert!(!d.contains("a").unwrap());
}

#[test]
fn test_pop_absent_field_fails() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    assert!(matches!(d.pop("z").unwrap_err(), Error::KeyNotFound));
}

#[test]
fn test_pop_or_present_removes_and_returns_stored() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    assert_eq!(d.pop_or("a", "fallback").unwrap(), "1");
    assert!(!d.contains("a").unwrap());
}

#[test]
fn test_pop_or_absent_returns_default() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    assert_eq!(d.pop_or("z", "fallback").unwrap(), "fallback");
    assert_eq!(d.len().unwrap(), 1);
}

#[test]
fn test_del_last_field_leaves_live_empty() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    d.del_item("a").unwrap();
    assert!(d.exists().unwrap());
    assert!(d.is_empty().unwrap());
}

// =============================================================================
// POPITEM
// =============================================================================

#[test]
fn test_popitem_returns_live_pair() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1"), ("b", "2")]).unwrap();
    let (field, value) = d.popitem().unwrap();
    let expected = map_of(&[("a", "1"), ("b", "2")]);
    assert_eq!(expected.get(&field), Some(&value));
    assert_eq!(d.len().unwrap(), 1);
    assert!(!d.contains(&field).unwrap());
}

#[test]
fn test_popitem_drains_whole_dict() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1"), ("b", "2")]).unwrap();
    let mut drained = HashMap::new();
    for _ in 0..2 {
        let (field, value) = d.popitem().unwrap();
        drained.insert(field, value);
    }
    assert_eq!(drained, map_of(&[("a", "1"), ("b", "2")]));
    assert!(d.is_empty().unwrap());
}

#[test]
fn test_popitem_empty_fails() {
    let pool = pool();
    let d = pool
        .dicts
        .create("cfg", Vec::<(String, String)>::new())
        .unwrap();
    assert!(matches!(d.popitem().unwrap_err(), Error::KeyNotFound));
}

// =============================================================================
// CLEAR / UPDATE
// =============================================================================

#[test]
fn test_clear_keeps_object_live() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    d.clear().unwrap();
    assert!(d.exists().unwrap());
    assert!(d.is_empty().unwrap());
}

#[test]
fn test_update_merges_and_overwrites() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1"), ("b", "2")]).unwrap();
    d.update([("b", "20"), ("c", "30")]).unwrap();
    assert_eq!(
        d.value().unwrap(),
        map_of(&[("a", "1"), ("b", "20"), ("c", "30")])
    );
}

#[test]
fn test_update_empty_on_existing_dict_succeeds() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    d.update(Vec::<(String, String)>::new()).unwrap();
    assert_eq!(d.len().unwrap(), 1);
}

#[test]
fn test_update_empty_on_missing_object_fails() {
    let pool = pool();
    // Unlike the sequence extends, an empty merge still checks liveness.
    let d = pool.dicts.bind("ghost");
    let err = d.update(Vec::<(String, String)>::new()).unwrap_err();
    assert!(matches!(err, Error::DoesNotExist { .. }));
}

// =============================================================================
// SETDEFAULT
// =============================================================================

#[test]
fn test_setdefault_absent_inserts_default() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    assert_eq!(d.setdefault("b", "2").unwrap(), "2");
    assert_eq!(d.get("b").unwrap().as_deref(), Some("2"));
}

#[test]
fn test_setdefault_present_keeps_stored_value() {
    let pool = pool();
    let d = pool.dicts.create("cfg", [("a", "1")]).unwrap();
    assert_eq!(d.setdefault("a", "other").unwrap(), "1");
    assert_eq!(d.get("a").unwrap().as_deref(), Some("1"));
}
