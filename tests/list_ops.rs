//! List Object Operations Tests
//!
//! Exercises every mutation and read on `PList` handles. Lists accept
//! arbitrary UTF-8 items; ordering follows insertion.

use tidepool::prelude::*;

fn pool() -> Tidepool {
    Tidepool::memory()
}

fn items(list: &PList) -> Vec<String> {
    list.value().unwrap()
}

// =============================================================================
// VALUE READ / WRITE
// =============================================================================

#[test]
fn test_create_and_read_items() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b", "c"]).unwrap();
    assert_eq!(items(&l), vec!["a", "b", "c"]);
    assert_eq!(l.len().unwrap(), 3);
}

#[test]
fn test_create_empty_list_is_live() {
    let pool = pool();
    let l = pool.lists.create("tasks", Vec::<String>::new()).unwrap();
    assert!(l.exists().unwrap());
    assert!(l.is_empty().unwrap());
    assert_eq!(items(&l), Vec::<String>::new());
}

#[test]
fn test_items_keep_unicode() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["日本語", "🦀"]).unwrap();
    assert_eq!(items(&l), vec!["日本語", "🦀"]);
}

#[test]
fn test_duplicate_items_preserved() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["x", "x", "y", "x"]).unwrap();
    assert_eq!(items(&l), vec!["x", "x", "y", "x"]);
}

#[test]
fn test_set_value_replaces_items() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b"]).unwrap();
    l.set_value(["p", "q", "r"]).unwrap();
    assert_eq!(items(&l), vec!["p", "q", "r"]);
}

#[test]
fn test_set_value_to_empty_keeps_live() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b"]).unwrap();
    l.set_value(Vec::<String>::new()).unwrap();
    assert!(l.exists().unwrap());
    assert!(l.is_empty().unwrap());
}

// =============================================================================
// SET ITEM
// =============================================================================

#[test]
fn test_set_item_by_index() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b", "c"]).unwrap();
    l.set_item(1, "B").unwrap();
    assert_eq!(items(&l), vec!["a", "B", "c"]);
}

#[test]
fn test_set_item_negative_index() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b", "c"]).unwrap();
    l.set_item(-1, "C").unwrap();
    assert_eq!(items(&l), vec!["a", "b", "C"]);
}

#[test]
fn test_set_item_out_of_range() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b"]).unwrap();
    assert!(matches!(
        l.set_item(2, "x").unwrap_err(),
        Error::IndexOutOfRange { index: 2, len: 2 }
    ));
    assert!(l.set_item(-3, "x").is_err());
    assert_eq!(items(&l), vec!["a", "b"]);
}

// =============================================================================
// INSERT (CLAMPING)
// =============================================================================

#[test]
fn test_insert_middle() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "c"]).unwrap();
    l.insert(1, "b").unwrap();
    assert_eq!(items(&l), vec!["a", "b", "c"]);
}

#[test]
fn test_insert_clamps_past_end() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b"]).unwrap();
    l.insert(99, "z").unwrap();
    assert_eq!(items(&l), vec!["a", "b", "z"]);
}

#[test]
fn test_insert_clamps_before_start() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["b", "c"]).unwrap();
    l.insert(-99, "a").unwrap();
    assert_eq!(items(&l), vec!["a", "b", "c"]);
}

#[test]
fn test_insert_into_empty_list() {
    let pool = pool();
    let l = pool.lists.create("tasks", Vec::<String>::new()).unwrap();
    l.insert(3, "only").unwrap();
    assert_eq!(items(&l), vec!["only"]);
}

// =============================================================================
// APPEND / EXTEND
// =============================================================================

#[test]
fn test_append() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a"]).unwrap();
    l.append("b").unwrap();
    l.append("c").unwrap();
    assert_eq!(items(&l), vec!["a", "b", "c"]);
}

#[test]
fn test_extend_appends_in_order() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a"]).unwrap();
    l.extend(["b", "c", "d"]).unwrap();
    assert_eq!(items(&l), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_extend_empty_is_total_noop() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a"]).unwrap();
    l.extend(Vec::<String>::new()).unwrap();
    assert_eq!(items(&l), vec!["a"]);
}

#[test]
fn test_extend_empty_skips_existence_check() {
    let pool = pool();
    let l = pool.lists.bind("ghost");
    l.extend(Vec::<String>::new()).unwrap();
    assert!(!l.exists().unwrap());
}

// =============================================================================
// REVERSE
// =============================================================================

#[test]
fn test_reverse() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b", "c"]).unwrap();
    l.reverse().unwrap();
    assert_eq!(items(&l), vec!["c", "b", "a"]);
}

#[test]
fn test_reverse_empty_list() {
    let pool = pool();
    let l = pool.lists.create("tasks", Vec::<String>::new()).unwrap();
    l.reverse().unwrap();
    assert!(l.is_empty().unwrap());
}

// =============================================================================
// POP
// =============================================================================

#[test]
fn test_pop_removes_last() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b", "c"]).unwrap();
    assert_eq!(l.pop().unwrap(), "c");
    assert_eq!(items(&l), vec!["a", "b"]);
}

#[test]
fn test_pop_at_head() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b", "c"]).unwrap();
    assert_eq!(l.pop_at(0).unwrap(), "a");
    assert_eq!(items(&l), vec!["b", "c"]);
}

#[test]
fn test_pop_at_negative_index() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b", "c", "d"]).unwrap();
    assert_eq!(l.pop_at(-2).unwrap(), "c");
    assert_eq!(items(&l), vec!["a", "b", "d"]);
}

#[test]
fn test_pop_last_item_leaves_live_empty() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["only"]).unwrap();
    assert_eq!(l.pop().unwrap(), "only");
    assert!(l.exists().unwrap());
    assert!(l.is_empty().unwrap());
}

#[test]
fn test_pop_empty_is_out_of_range() {
    let pool = pool();
    let l = pool.lists.create("tasks", Vec::<String>::new()).unwrap();
    assert!(matches!(
        l.pop().unwrap_err(),
        Error::IndexOutOfRange { index: -1, len: 0 }
    ));
}

#[test]
fn test_pop_at_out_of_range_leaves_items() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b"]).unwrap();
    assert!(l.pop_at(5).is_err());
    assert_eq!(items(&l), vec!["a", "b"]);
}

// =============================================================================
// REMOVE
// =============================================================================

#[test]
fn test_remove_first_occurrence_only() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b", "a", "b"]).unwrap();
    l.remove("b").unwrap();
    assert_eq!(items(&l), vec!["a", "a", "b"]);
}

#[test]
fn test_remove_missing_item() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["a", "b"]).unwrap();
    assert!(matches!(l.remove("z").unwrap_err(), Error::ValueNotFound));
    assert_eq!(items(&l), vec!["a", "b"]);
}

#[test]
fn test_remove_last_remaining_item() {
    let pool = pool();
    let l = pool.lists.create("tasks", ["only"]).unwrap();
    l.remove("only").unwrap();
    assert!(l.exists().unwrap());
    assert!(l.is_empty().unwrap());
}
