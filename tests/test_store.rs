//! Integration tests for the history store.

use tempfile::TempDir;

use symcalc::store::{CalcType, HistoryStore, NewCalculation, StoreError};

// ── helpers ──────────────────────────────────────────────────────────────────

fn store() -> (TempDir, HistoryStore) {
    let tmp = TempDir::new().expect("tempdir");
    let store = HistoryStore::open(tmp.path().join("calculations.db")).expect("open store");
    (tmp, store)
}

fn record(input: &str, result: &str) -> NewCalculation {
    NewCalculation {
        input_expr: input.into(),
        result: result.into(),
        calc_type: CalcType::Evaluate,
    }
}

// ── tests ────────────────────────────────────────────────────────────────────

#[test]
fn open_creates_db_file() {
    let (tmp, _store) = store();
    assert!(tmp.path().join("calculations.db").exists());
}

#[test]
fn open_creates_missing_parent_dirs() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("data").join("calculations.db");
    let _store = HistoryStore::open(&nested).expect("open should create parents");
    assert!(nested.exists());
}

#[test]
fn create_assigns_id_and_timestamp() {
    let (_tmp, store) = store();
    let rec = store.create(record("1 + 1", "2")).unwrap();
    assert!(rec.id > 0);
    assert!(!rec.created_at.is_empty());
    assert_eq!(rec.input_expr, "1 + 1");
    assert_eq!(rec.result, "2");
}

#[test]
fn just_created_record_lists_first() {
    let (_tmp, store) = store();
    store.create(record("a", "a")).unwrap();
    store.create(record("b", "b")).unwrap();
    let last = store.create(record("c", "c")).unwrap();

    let listed = store.list_recent(1).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, last.id);
    assert_eq!(listed[0].input_expr, "c");
}

#[test]
fn list_recent_is_newest_first_and_truncated() {
    let (_tmp, store) = store();
    for i in 0..5 {
        store.create(record(&format!("expr{i}"), "r")).unwrap();
    }

    let listed = store.list_recent(3).unwrap();
    assert_eq!(listed.len(), 3);
    let ids: Vec<i64> = listed.iter().map(|r| r.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted, "expected descending ids, got {ids:?}");
}

#[test]
fn delete_removes_only_the_target() {
    let (_tmp, store) = store();
    let a = store.create(record("a", "a")).unwrap();
    let b = store.create(record("b", "b")).unwrap();

    store.delete(a.id).unwrap();

    let remaining = store.list_recent(10).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, b.id);
}

#[test]
fn delete_missing_id_is_not_found_and_leaves_others() {
    let (_tmp, store) = store();
    let a = store.create(record("a", "a")).unwrap();

    let err = store.delete(a.id + 1000).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    assert_eq!(store.list_recent(10).unwrap().len(), 1);
}

#[test]
fn ids_are_never_reused_after_deletion() {
    let (_tmp, store) = store();
    let first = store.create(record("a", "a")).unwrap();
    store.delete(first.id).unwrap();

    let second = store.create(record("b", "b")).unwrap();
    assert!(second.id > first.id, "id {} reused after delete", first.id);
}

#[test]
fn records_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("calculations.db");
    {
        let store = HistoryStore::open(&path).unwrap();
        store.create(record("persisted", "1")).unwrap();
    }
    let reopened = HistoryStore::open(&path).unwrap();
    let listed = reopened.list_recent(10).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].input_expr, "persisted");
}

#[test]
fn calc_type_roundtrips_through_storage() {
    let (_tmp, store) = store();
    store
        .create(NewCalculation {
            input_expr: "d/dx x**2".into(),
            result: "2*x".into(),
            calc_type: CalcType::Differentiate,
        })
        .unwrap();
    let listed = store.list_recent(1).unwrap();
    assert_eq!(listed[0].calc_type, CalcType::Differentiate);
}
