use tabula::core::{
    db::query::{Column, Relation, Source},
    model::{ColumnModel, SourceModel},
    value::ValueKind,
};

///
/// Models
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

pub static MEMBER_MODEL: SourceModel = SourceModel::new("member", "id", &MEMBER_COLUMNS);
pub static TEAM_MODEL: SourceModel = SourceModel::new("team", "id", &TEAM_COLUMNS);

///
/// QMember
///
/// Typed handles for one alias of the member source. `MEMBER` is the
/// default alias; `QMember::new("memberSub")` gives an independent alias
/// for subqueries and self joins.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QMember {
    pub source: Source,
    pub id: Column<i64>,
    pub username: Column<String>,
    pub age: Column<i32>,
    pub team_id: Column<i64>,
}

impl QMember {
    #[must_use]
    pub const fn new(alias: &'static str) -> Self {
        let source = Source::aliased(&MEMBER_MODEL, alias);

        Self {
            source,
            id: source.column("id"),
            username: source.column("username"),
            age: source.column("age"),
            team_id: source.column("team_id"),
        }
    }

    /// `member.team`: many-to-one onto `team.id`.
    #[must_use]
    pub const fn team(self) -> Relation {
        Relation::new(self.team_id.column_ref(), "id")
    }
}

pub const MEMBER: QMember = QMember::new("member");

///
/// QTeam
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QTeam {
    pub source: Source,
    pub id: Column<i64>,
    pub name: Column<String>,
}

impl QTeam {
    #[must_use]
    pub const fn new(alias: &'static str) -> Self {
        let source = Source::aliased(&TEAM_MODEL, alias);

        Self {
            source,
            id: source.column("id"),
            name: source.column("name"),
        }
    }
}

pub const TEAM: QTeam = QTeam::new("team");
