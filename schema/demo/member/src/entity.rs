use serde::{Deserialize, Serialize};
use tabula::core::{
    db::{
        query::{Bean, EntityRow},
        row::Row,
    },
    value::{FromValue, Value, ValueConversionError, ValueKind},
};

///
/// Member
///
/// `id` is `None` until the row is saved.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Member {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
}

impl Member {
    #[must_use]
    pub fn new(username: &str, age: i32) -> Self {
        Self {
            username: Some(username.to_string()),
            age,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_team(username: &str, age: i32, team: &Team) -> Self {
        Self {
            team_id: team.id,
            ..Self::new(username, age)
        }
    }

    pub(crate) fn to_row(&self) -> Row {
        let row = Row::new()
            .with("username", self.username.clone())
            .with("age", self.age)
            .with("team_id", self.team_id);

        match self.id {
            Some(id) => row.with("id", id),
            None => row,
        }
    }
}

impl Bean for Member {
    const PROPERTIES: &'static [(&'static str, ValueKind)] = &[
        ("id", ValueKind::Int),
        ("username", ValueKind::Text),
        ("age", ValueKind::Int),
        ("team_id", ValueKind::Int),
    ];

    fn set(&mut self, property: &str, value: Value) -> Result<(), ValueConversionError> {
        match property {
            "id" => self.id = FromValue::from_value(value)?,
            "username" => self.username = FromValue::from_value(value)?,
            "age" => self.age = FromValue::from_value(value)?,
            "team_id" => self.team_id = FromValue::from_value(value)?,
            _ => {}
        }

        Ok(())
    }
}

///
/// Team
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Team {
    pub id: Option<i64>,
    pub name: String,
}

impl Team {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }

    pub(crate) fn to_row(&self) -> Row {
        let row = Row::new().with("name", self.name.as_str());

        match self.id {
            Some(id) => row.with("id", id),
            None => row,
        }
    }
}

impl Bean for Team {
    const PROPERTIES: &'static [(&'static str, ValueKind)] =
        &[("id", ValueKind::Int), ("name", ValueKind::Text)];

    fn set(&mut self, property: &str, value: Value) -> Result<(), ValueConversionError> {
        match property {
            "id" => self.id = FromValue::from_value(value)?,
            "name" => self.name = FromValue::from_value(value)?,
            _ => {}
        }

        Ok(())
    }
}

///
/// MemberWithTeam
/// Member row plus its fetch-joined team, if any.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberWithTeam {
    pub member: Member,
    pub team: Option<Team>,
}

impl MemberWithTeam {
    pub(crate) fn from_entity(entity: &EntityRow, team_alias: &str) -> Result<Self, ValueConversionError> {
        let member = read_bean::<Member>(&entity.row)?;
        let team = entity
            .fetched(team_alias)
            .map(read_bean::<Team>)
            .transpose()?;

        Ok(Self { member, team })
    }
}

fn read_bean<T: Bean>(row: &Row) -> Result<T, ValueConversionError> {
    let mut bean = T::default();
    for (name, value) in row.iter() {
        bean.set(name, value.clone())?;
    }

    Ok(bean)
}
