use serde::{Deserialize, Serialize};
use tabula::core::{
    db::query::{Bean, FromTuple},
    value::{FromValue, Value, ValueConversionError, ValueKind},
};

///
/// MemberDto
///
/// Binds either by position (`constructor`) from `(username, age)` or by
/// label (`bean`) from `username` and `age`.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MemberDto {
    pub username: Option<String>,
    pub age: i32,
}

impl MemberDto {
    #[must_use]
    pub fn new(username: &str, age: i32) -> Self {
        Self {
            username: Some(username.to_string()),
            age,
        }
    }
}

impl FromTuple for MemberDto {
    type Args = (Option<String>, i32);

    fn from_args((username, age): Self::Args) -> Self {
        Self { username, age }
    }
}

impl Bean for MemberDto {
    const PROPERTIES: &'static [(&'static str, ValueKind)] =
        &[("username", ValueKind::Text), ("age", ValueKind::Int)];

    fn set(&mut self, property: &str, value: Value) -> Result<(), ValueConversionError> {
        match property {
            "username" => self.username = FromValue::from_value(value)?,
            "age" => self.age = FromValue::from_value(value)?,
            _ => {}
        }

        Ok(())
    }
}

///
/// UserDto
/// Bean whose property names differ from the member columns; select with
/// `username.as_("name")`.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserDto {
    pub name: Option<String>,
    pub age: i32,
}

impl Bean for UserDto {
    const PROPERTIES: &'static [(&'static str, ValueKind)] =
        &[("name", ValueKind::Text), ("age", ValueKind::Int)];

    fn set(&mut self, property: &str, value: Value) -> Result<(), ValueConversionError> {
        match property {
            "name" => self.name = FromValue::from_value(value)?,
            "age" => self.age = FromValue::from_value(value)?,
            _ => {}
        }

        Ok(())
    }
}

///
/// MemberTeamDto
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MemberTeamDto {
    pub member_id: i64,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
}

impl FromTuple for MemberTeamDto {
    type Args = (i64, Option<String>, i32, Option<i64>, Option<String>);

    fn from_args((member_id, username, age, team_id, team_name): Self::Args) -> Self {
        Self {
            member_id,
            username,
            age,
            team_id,
            team_name,
        }
    }
}

///
/// MemberSearchCondition
///
/// Every field is optional; blank text counts as absent.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MemberSearchCondition {
    pub username: Option<String>,
    pub team_name: Option<String>,
    pub age_goe: Option<i32>,
    pub age_loe: Option<i32>,
}

impl MemberSearchCondition {
    #[must_use]
    pub fn team_name(mut self, team_name: &str) -> Self {
        self.team_name = Some(team_name.to_string());
        self
    }

    #[must_use]
    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    #[must_use]
    pub const fn age_between(mut self, goe: Option<i32>, loe: Option<i32>) -> Self {
        self.age_goe = goe;
        self.age_loe = loe;
        self
    }
}
