use crate::{
    dto::{MemberSearchCondition, MemberTeamDto},
    entity::{Member, MemberWithTeam, Team},
    schema::{MEMBER, MEMBER_MODEL, TEAM, TEAM_MODEL},
};
use tabula::{
    Error,
    core::db::{
        Session,
        query::{ConditionBuilder, Predicate, Query},
        response::{Page, PageRequest},
        store::MemoryStore,
    },
};

///
/// MemberRepository
///
/// Member/Team persistence plus the search queries over them. Reads go
/// through a `Session`, so every lookup is an executed query rather than a
/// direct store probe.
///

pub struct MemberRepository<'a> {
    store: &'a MemoryStore,
    session: Session<'a>,
}

impl<'a> MemberRepository<'a> {
    /// Registers the member and team sources on `store`.
    #[must_use]
    pub fn new(store: &'a MemoryStore) -> Self {
        store.register(&MEMBER_MODEL);
        store.register(&TEAM_MODEL);

        Self {
            store,
            session: Session::new(store),
        }
    }

    #[must_use]
    pub fn debug(mut self) -> Self {
        self.session = self.session.debug();
        self
    }

    #[must_use]
    pub const fn session(&self) -> &Session<'a> {
        &self.session
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Insert `member` and return it with its assigned id.
    pub fn save(&self, member: Member) -> Result<Member, Error> {
        let id = self.store.insert(&MEMBER_MODEL, member.to_row())?;

        Ok(Member {
            id: Some(id),
            ..member
        })
    }

    pub fn save_team(&self, team: Team) -> Result<Team, Error> {
        let id = self.store.insert(&TEAM_MODEL, team.to_row())?;

        Ok(Team {
            id: Some(id),
            ..team
        })
    }

    // ---------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------

    pub fn find_by_id(&self, id: i64) -> Result<Option<Member>, Error> {
        let query = Query::select_from(MEMBER.source)
            .filter(MEMBER.id.eq(id))
            .build()?
            .bean::<Member>()?;

        Ok(self.session.fetch_one(&query)?)
    }

    pub fn find_all(&self) -> Result<Vec<Member>, Error> {
        let query = Query::select_from(MEMBER.source)
            .order_by(MEMBER.id.asc())
            .build()?
            .bean::<Member>()?;

        Ok(self.session.fetch(&query)?)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Vec<Member>, Error> {
        let query = Query::select_from(MEMBER.source)
            .filter(MEMBER.username.eq(username))
            .order_by(MEMBER.id.asc())
            .build()?
            .bean::<Member>()?;

        Ok(self.session.fetch(&query)?)
    }

    /// Member with its team loaded in the same execution.
    pub fn find_with_team(&self, id: i64) -> Result<Option<MemberWithTeam>, Error> {
        let query = Query::select_from(MEMBER.source)
            .left_join_to(MEMBER.team(), TEAM.source)
            .fetch_join()
            .filter(MEMBER.id.eq(id))
            .build()?
            .entities()?;

        self.session
            .fetch_one(&query)?
            .map(|entity| MemberWithTeam::from_entity(&entity, TEAM.source.alias()))
            .transpose()
            .map_err(Error::from)
    }

    // ---------------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------------

    /// Members matching every present condition, with their team if any.
    pub fn search(&self, condition: &MemberSearchCondition) -> Result<Vec<MemberTeamDto>, Error> {
        let query = search_query()
            .filter_all(search_conditions(condition))
            .build()?
            .constructor::<MemberTeamDto>()?;

        Ok(self.session.fetch(&query)?)
    }

    /// Same result as `search`, composed through a `ConditionBuilder`.
    pub fn search_by_builder(
        &self,
        condition: &MemberSearchCondition,
    ) -> Result<Vec<MemberTeamDto>, Error> {
        let mut builder = ConditionBuilder::new();
        for predicate in search_conditions(condition) {
            builder.and(predicate);
        }

        let query = search_query()
            .filter_opt(builder.build())
            .build()?
            .constructor::<MemberTeamDto>()?;

        Ok(self.session.fetch(&query)?)
    }

    /// One page of search results; content and count both run every time.
    pub fn search_page_simple(
        &self,
        condition: &MemberSearchCondition,
        request: PageRequest,
    ) -> Result<Page<MemberTeamDto>, Error> {
        let query = search_query()
            .filter_all(search_conditions(condition))
            .build()?
            .constructor::<MemberTeamDto>()?;

        Ok(self.session.fetch_page(&query, request)?)
    }

    /// One page of search results. The count runs as its own lighter query,
    /// and only when the page content cannot determine the total.
    pub fn search_page_complex(
        &self,
        condition: &MemberSearchCondition,
        request: PageRequest,
    ) -> Result<Page<MemberTeamDto>, Error> {
        let content = search_query()
            .filter_all(search_conditions(condition))
            .build()?
            .constructor::<MemberTeamDto>()?
            .with_window(request.offset(), Some(request.size));

        let count = Query::select(MEMBER.id)
            .from(MEMBER.source)
            .left_join_to(MEMBER.team(), TEAM.source)
            .filter_all(search_conditions(condition))
            .build()?
            .tuples()?;

        let rows = self.session.fetch(&content)?;

        Ok(Page::with_lazy_count(rows, request, || {
            self.session.fetch_count(&count)
        })?)
    }

    // ---------------------------------------------------------------------
    // Fixture
    // ---------------------------------------------------------------------

    /// teamA(member1 10, member2 20), teamB(member3 30, member4 40).
    pub fn seed_fixture(&self) -> Result<(Team, Team), Error> {
        let team_a = self.save_team(Team::new("teamA"))?;
        let team_b = self.save_team(Team::new("teamB"))?;

        self.save(Member::with_team("member1", 10, &team_a))?;
        self.save(Member::with_team("member2", 20, &team_a))?;
        self.save(Member::with_team("member3", 30, &team_b))?;
        self.save(Member::with_team("member4", 40, &team_b))?;

        Ok((team_a, team_b))
    }
}

fn search_query() -> Query {
    Query::select((
        MEMBER.id.as_("member_id"),
        MEMBER.username,
        MEMBER.age,
        TEAM.id.as_("team_id"),
        TEAM.name.as_("team_name"),
    ))
    .from(MEMBER.source)
    .left_join_to(MEMBER.team(), TEAM.source)
    .order_by(MEMBER.id.asc())
}

fn search_conditions(condition: &MemberSearchCondition) -> [Option<Predicate>; 4] {
    [
        has_text(condition.username.as_deref()).map(|name| MEMBER.username.eq(name)),
        has_text(condition.team_name.as_deref()).map(|name| TEAM.name.eq(name)),
        condition.age_goe.map(|age| MEMBER.age.goe(age)),
        condition.age_loe.map(|age| MEMBER.age.loe(age)),
    ]
}

fn has_text(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.trim().is_empty())
}
