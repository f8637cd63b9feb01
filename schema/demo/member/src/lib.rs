//! Member/Team demo for Tabula: source models and typed handles, record
//! and DTO types, and a repository running the search and paging queries.

pub mod dto;
pub mod entity;
pub mod repository;
pub mod schema;

// re-exports
pub use dto::{MemberDto, MemberSearchCondition, MemberTeamDto, UserDto};
pub use entity::{Member, MemberWithTeam, Team};
pub use repository::MemberRepository;
pub use schema::{MEMBER, MEMBER_MODEL, QMember, QTeam, TEAM, TEAM_MODEL};
