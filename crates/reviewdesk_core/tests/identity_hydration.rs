mod common;

use common::{review_count, seeded_conn};
use reviewdesk_core::{
    Employee, EmployeeId, PersistState, RepoError, ReviewRow, ReviewStore, ReviewValidationError,
    SqliteEmployeeDirectory, WriteOutcome,
};
use std::collections::BTreeMap;
use std::rc::Rc;

#[test]
fn repeated_find_by_id_returns_same_instance() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();
    conn.execute(
        "INSERT INTO reviews (id, year, summary, employee_id) VALUES (5, 2023, 'Loaded', 2);",
        [],
    )
    .unwrap();

    let first = store.find_by_id(5).unwrap().unwrap();
    let second = store.find_by_id(5).unwrap().unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(store.identity_map_len(), 1);
}

#[test]
fn find_by_id_returns_saved_instance_itself() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let created = store.create(2024, "Same object", 1).unwrap();
    let id = created.borrow().id().unwrap();

    let found = store.find_by_id(id).unwrap().unwrap();
    assert!(Rc::ptr_eq(&created, &found));
}

#[test]
fn find_by_id_of_unknown_id_is_none() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    assert!(store.find_by_id(404).unwrap().is_none());
    assert_eq!(store.identity_map_len(), 0);
}

#[test]
fn rehydration_refreshes_cached_instance_in_place() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let review = store.create(2022, "Before", 1).unwrap();
    let id = review.borrow().id().unwrap();
    conn.execute(
        "UPDATE reviews SET year = 2023, summary = 'After', employee_id = 2 WHERE id = ?1;",
        [id],
    )
    .unwrap();

    let refreshed = store.find_by_id(id).unwrap().unwrap();

    assert!(Rc::ptr_eq(&review, &refreshed));
    let current = review.borrow();
    assert_eq!(current.year(), 2023);
    assert_eq!(current.summary(), "After");
    assert_eq!(current.employee_id(), 2);
}

#[test]
fn get_all_returns_rows_in_storage_order_sharing_cached_instances() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let first = store.create(2021, "One", 1).unwrap();
    let second = store.create(2022, "Two", 2).unwrap();
    let third = store.create(2023, "Three", 3).unwrap();

    let all = store.get_all().unwrap();

    assert_eq!(all.len(), 3);
    assert!(Rc::ptr_eq(&all[0], &first));
    assert!(Rc::ptr_eq(&all[1], &second));
    assert!(Rc::ptr_eq(&all[2], &third));
}

#[test]
fn get_all_registers_rows_written_outside_the_session() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();
    conn.execute_batch(
        "INSERT INTO reviews (year, summary, employee_id) VALUES (2020, 'A', 1);
         INSERT INTO reviews (year, summary, employee_id) VALUES (2021, 'B', 3);",
    )
    .unwrap();

    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(store.identity_map_len(), 2);

    let again = store.get_all().unwrap();
    assert!(all.iter().zip(&again).all(|(a, b)| Rc::ptr_eq(a, b)));
}

#[test]
fn invalid_persisted_row_is_rejected_and_cache_left_untouched() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let review = store.create(2024, "Valid", 1).unwrap();
    let id = review.borrow().id().unwrap();
    conn.execute("UPDATE reviews SET year = 1850 WHERE id = ?1;", [id])
        .unwrap();

    let err = store.find_by_id(id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ReviewValidationError::YearOutOfRange(1850))
    ));
    assert_eq!(review.borrow().year(), 2024);
}

#[test]
fn null_column_is_reported_as_invalid_data() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();
    conn.execute(
        "INSERT INTO reviews (id, year, summary, employee_id) VALUES (8, 2024, NULL, 1);",
        [],
    )
    .unwrap();

    let err = store.find_by_id(8).unwrap_err();
    match err {
        RepoError::InvalidData(message) => assert!(message.contains("reviews.summary")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn hydrate_row_works_with_in_memory_directory() {
    let conn = seeded_conn();
    let directory: BTreeMap<EmployeeId, Employee> =
        BTreeMap::from([(7, Employee::new(7, "Edsger Dijkstra", "Professor"))]);
    let mut store = ReviewStore::new(&conn, directory);

    let row = ReviewRow {
        id: 11,
        year: 2030,
        summary: "Hydrated".to_string(),
        employee_id: 7,
    };
    let first = store.hydrate_row(row.clone()).unwrap();
    let second = store.hydrate_row(row).unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.borrow().id(), Some(11));
    assert!(store.cached(11).is_some());

    let unknown = ReviewRow {
        id: 12,
        year: 2030,
        summary: "Orphan".to_string(),
        employee_id: 1,
    };
    assert!(matches!(
        store.hydrate_row(unknown),
        Err(RepoError::Validation(ReviewValidationError::UnknownEmployee(1)))
    ));
    assert!(store.cached(12).is_none());
}

#[test]
fn review_serializes_with_nullable_id() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let transient = store.build(2024, "Draft", 1).unwrap();
    let json = serde_json::to_value(&*transient.borrow()).unwrap();
    assert_eq!(json["id"], serde_json::Value::Null);

    let saved = store.create(2024, "Final", 2).unwrap();
    let id = saved.borrow().id().unwrap();
    let json = serde_json::to_value(&*saved.borrow()).unwrap();
    assert_eq!(json["id"], id);
    assert_eq!(json["year"], 2024);
    assert_eq!(json["summary"], "Final");
    assert_eq!(json["employee_id"], 2);
}

#[test]
fn reused_row_id_resets_stale_instance_to_transient() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let old = store.create(2021, "Old", 1).unwrap();
    let id = old.borrow().id().unwrap();
    conn.execute("DELETE FROM reviews WHERE id = ?1;", [id])
        .unwrap();

    let new = store.create(2022, "New", 2).unwrap();
    assert_eq!(new.borrow().id(), Some(id));
    assert_eq!(old.borrow().state(), PersistState::Transient);

    assert_eq!(
        store.update(&old).unwrap(),
        WriteOutcome::Skipped(PersistState::Transient)
    );
    let found = store.find_by_id(id).unwrap().unwrap();
    assert!(Rc::ptr_eq(&found, &new));
    assert_eq!(found.borrow().summary(), "New");
    assert_eq!(found.borrow().year(), 2022);
}

#[test]
fn save_is_rolled_back_when_displaced_instance_is_borrowed() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let old = store.create(2021, "Old", 1).unwrap();
    let id = old.borrow().id().unwrap();
    conn.execute("DELETE FROM reviews WHERE id = ?1;", [id])
        .unwrap();

    let new = store.build(2022, "New", 2).unwrap();
    let held = old.borrow();
    let err = store.save(&new).unwrap_err();
    drop(held);

    assert!(matches!(err, RepoError::Borrowed(borrowed) if borrowed == id));
    assert_eq!(new.borrow().state(), PersistState::Transient);
    assert_eq!(old.borrow().id(), Some(id));
    assert_eq!(review_count(&conn), 0);
}

#[test]
fn hydrating_a_borrowed_instance_returns_error() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let review = store.create(2024, "Held", 1).unwrap();
    let id = review.borrow().id().unwrap();

    let held = review.borrow();
    let err = store.find_by_id(id).unwrap_err();
    assert!(matches!(err, RepoError::Borrowed(borrowed) if borrowed == id));
    assert!(matches!(store.get_all(), Err(RepoError::Borrowed(_))));
    drop(held);

    let found = store.find_by_id(id).unwrap().unwrap();
    assert!(Rc::ptr_eq(&found, &review));
}

#[test]
fn deleting_a_borrowed_instance_leaves_row_in_place() {
    let conn = seeded_conn();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    store.create_table().unwrap();

    let review = store.create(2024, "Held", 1).unwrap();
    let id = review.borrow().id().unwrap();

    let held = review.borrow();
    let err = store.delete(&review).unwrap_err();
    drop(held);

    assert!(matches!(err, RepoError::Borrowed(borrowed) if borrowed == id));
    assert_eq!(review_count(&conn), 1);
    assert!(store.cached(id).is_some());
    assert_eq!(review.borrow().id(), Some(id));
}
