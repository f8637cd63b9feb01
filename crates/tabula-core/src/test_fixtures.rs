use crate::{
    db::{
        query::{Column, Source},
        row::Row,
        store::MemoryStore,
    },
    model::{ColumnModel, SourceModel},
    value::{Value, ValueKind},
};

///
/// Member / Team
///
/// Test-only schema shared by unit tests across the crate:
/// teamA(member1 10, member2 20), teamB(member3 30, member4 40).
///

static MEMBER_COLUMNS: [ColumnModel; 4] = [
    ColumnModel::new("id", ValueKind::Int),
    ColumnModel::new("username", ValueKind::Text).nullable(),
    ColumnModel::new("age", ValueKind::Int),
    ColumnModel::new("team_id", ValueKind::Int).nullable(),
];

static TEAM_COLUMNS: [ColumnModel; 2] = [
    ColumnModel::new("id", ValueKind::Int),
    ColumnModel::new("name", ValueKind::Text),
];

pub(crate) static MEMBER_MODEL: SourceModel = SourceModel::new("member", "id", &MEMBER_COLUMNS);
pub(crate) static TEAM_MODEL: SourceModel = SourceModel::new("team", "id", &TEAM_COLUMNS);

pub(crate) fn member() -> Source {
    Source::new(&MEMBER_MODEL)
}

pub(crate) fn member_alias(alias: &'static str) -> Source {
    Source::aliased(&MEMBER_MODEL, alias)
}

pub(crate) fn team() -> Source {
    Source::new(&TEAM_MODEL)
}

pub(crate) fn id(source: Source) -> Column<i64> {
    source.column("id")
}

pub(crate) fn username(source: Source) -> Column<String> {
    source.column("username")
}

pub(crate) fn age(source: Source) -> Column<i32> {
    source.column("age")
}

pub(crate) fn team_id(source: Source) -> Column<i64> {
    source.column("team_id")
}

pub(crate) fn team_name(source: Source) -> Column<String> {
    source.column("name")
}

/// Empty store with both tables registered.
pub(crate) fn empty_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.register(&MEMBER_MODEL);
    store.register(&TEAM_MODEL);

    store
}

pub(crate) fn insert_team(store: &MemoryStore, name: &str) -> i64 {
    store
        .insert(&TEAM_MODEL, Row::new().with("name", name))
        .expect("team insert should succeed")
}

pub(crate) fn insert_member(
    store: &MemoryStore,
    username: Option<&str>,
    age: i32,
    team: Option<i64>,
) -> i64 {
    let row = Row::new()
        .with("username", username)
        .with("age", age)
        .with("team_id", team);

    store
        .insert(&MEMBER_MODEL, row)
        .expect("member insert should succeed")
}

/// The four-member, two-team fixture.
pub(crate) fn seeded_store() -> MemoryStore {
    let store = empty_store();
    let team_a = insert_team(&store, "teamA");
    let team_b = insert_team(&store, "teamB");

    insert_member(&store, Some("member1"), 10, Some(team_a));
    insert_member(&store, Some("member2"), 20, Some(team_a));
    insert_member(&store, Some("member3"), 30, Some(team_b));
    insert_member(&store, Some("member4"), 40, Some(team_b));

    store
}

/// Text values of one column, in row order.
pub(crate) fn texts<'a>(values: impl IntoIterator<Item = &'a Value>) -> Vec<Option<String>> {
    values
        .into_iter()
        .map(|value| value.as_text().map(ToString::to_string))
        .collect()
}
