use super::*;
use crate::{
    db::query::Update,
    error::ErrorClass,
    test_fixtures::{
        MEMBER_MODEL, TEAM_MODEL, age, empty_store, insert_member, member, seeded_store,
    },
};

fn store_error(result: Result<i64, InternalError>) -> InternalError {
    result.expect_err("insert should be rejected")
}

#[test]
fn insert_assigns_increasing_keys() {
    let store = empty_store();

    assert_eq!(insert_member(&store, Some("a"), 1, None), 1);
    assert_eq!(insert_member(&store, Some("b"), 2, None), 2);
    assert_eq!(store.len(&MEMBER_MODEL), 2);
}

#[test]
fn explicit_key_advances_the_sequence() {
    let store = empty_store();
    let key = store
        .insert(&MEMBER_MODEL, Row::new().with("id", 10).with("age", 1))
        .expect("insert should succeed");
    assert_eq!(key, 10);

    assert_eq!(insert_member(&store, None, 2, None), 11);
}

#[test]
fn duplicate_key_is_a_conflict() {
    let store = seeded_store();
    let err = store_error(store.insert(&MEMBER_MODEL, Row::new().with("id", 1).with("age", 5)));

    assert_eq!(err.class, ErrorClass::Conflict);
    assert_eq!(store.len(&MEMBER_MODEL), 4);
}

#[test]
fn missing_required_column_is_rejected() {
    let store = empty_store();
    let err = store_error(store.insert(&MEMBER_MODEL, Row::new().with("username", "x")));

    assert_eq!(err.class, ErrorClass::Unsupported);
    assert!(err.message.contains("not nullable"), "{}", err.message);
}

#[test]
fn unknown_column_is_rejected() {
    let store = empty_store();
    let err = store_error(
        store.insert(&MEMBER_MODEL, Row::new().with("age", 1).with("nickname", "x")),
    );

    assert!(err.message.contains("unknown column 'nickname'"), "{}", err.message);
}

#[test]
fn kind_mismatch_is_rejected() {
    let store = empty_store();
    let err = store_error(store.insert(&MEMBER_MODEL, Row::new().with("age", "ten")));

    assert_eq!(err.class, ErrorClass::Unsupported);
}

#[test]
fn text_primary_key_is_rejected() {
    let store = empty_store();
    let err = store_error(store.insert(&TEAM_MODEL, Row::new().with("id", "a").with("name", "x")));

    assert!(err.message.contains("must be an integer"), "{}", err.message);
}

#[test]
fn unregistered_source_is_not_found() {
    let store = MemoryStore::new();
    let err = store_error(store.insert(&MEMBER_MODEL, Row::new().with("age", 1)));

    assert!(err.is_not_found());
    assert!(store.scan("member").is_err());
}

#[test]
fn stored_rows_carry_every_column_in_model_order() {
    let store = empty_store();
    let key = insert_member(&store, Some("a"), 3, None);
    let row = store.get(&MEMBER_MODEL, key).expect("row should exist");

    let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["id", "username", "age", "team_id"]);
    assert_eq!(row.get("team_id"), Some(&Value::Null));
}

#[test]
fn register_keeps_existing_rows() {
    let store = seeded_store();
    store.register(&MEMBER_MODEL);

    assert_eq!(store.len(&MEMBER_MODEL), 4);
}

#[test]
fn clear_empties_one_table() {
    let store = seeded_store();
    store.clear(&MEMBER_MODEL);

    assert!(store.is_empty(&MEMBER_MODEL));
    assert_eq!(store.len(&TEAM_MODEL), 2);
    assert_eq!(store.get(&MEMBER_MODEL, 1), None);
}

#[test]
fn update_rejects_primary_key_assignment() {
    let store = seeded_store();
    let m = member();
    let spec = Update::table(m)
        .set(m.column::<i64>("id"), 99)
        .build()
        .expect("update should build");

    let err = store
        .update(m, spec.filter(), spec.assignments())
        .expect_err("primary key update should fail");
    assert!(err.to_string().contains("cannot be updated"), "{err}");
}

#[test]
fn update_rejects_null_into_required_column() {
    let store = seeded_store();
    let m = member();
    let spec = Update::table(m)
        .set_null(age(m))
        .build()
        .expect("update should build");

    assert!(store.update(m, spec.filter(), spec.assignments()).is_err());
    assert_eq!(
        store.get(&MEMBER_MODEL, 1).and_then(|row| row.get("age").cloned()),
        Some(Value::Int(10))
    );
}

#[test]
fn delete_keeps_unmatched_rows() {
    let store = seeded_store();
    let m = member();

    let removed = store
        .delete(m, &age(m).loe(20))
        .expect("delete should succeed");
    assert_eq!(removed, 2);
    assert!(store.get(&MEMBER_MODEL, 3).is_some());
    assert!(store.get(&MEMBER_MODEL, 1).is_none());
}
