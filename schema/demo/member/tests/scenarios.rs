use tabula::prelude::*;
use tabula_demo_member::{
    MEMBER, Member, MemberDto, MemberRepository, QMember, TEAM, UserDto,
};

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    MemberRepository::new(&store)
        .seed_fixture()
        .expect("seed should succeed");

    store
}

fn names(session: &Session<'_>, query: Query) -> Vec<Option<String>> {
    let query = query
        .build()
        .expect("query should build")
        .scalars::<Option<String>>()
        .expect("single text column");

    session.fetch(&query).expect("query should execute")
}

fn text(name: &str) -> Option<String> {
    Some(name.to_string())
}

#[test]
fn find_member1_by_name() {
    let store = seeded();
    let query = Query::select_from(MEMBER.source)
        .filter(MEMBER.username.eq("member1"))
        .build()
        .expect("query should build")
        .bean::<Member>()
        .expect("whole-row select binds to Member");

    let found = Session::new(&store)
        .fetch_one(&query)
        .expect("query should execute")
        .expect("member1 should exist");
    assert_eq!(found.username.as_deref(), Some("member1"));
    assert_eq!(found.age, 10);
}

#[test]
fn search_with_chained_and_between() {
    let store = seeded();
    let query = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .filter(
            MEMBER
                .username
                .eq("member1")
                .and(MEMBER.age.between(10, 30)),
        );

    assert_eq!(names(&Session::new(&store), query), [text("member1")]);
}

#[test]
fn sort_by_age_desc_then_name_nulls_last() {
    let store = seeded();
    let repo = MemberRepository::new(&store);
    repo.save(Member {
        username: None,
        ..Member::new("", 100)
    })
    .expect("save should succeed");
    repo.save(Member::new("member5", 100))
        .expect("save should succeed");
    repo.save(Member::new("member6", 100))
        .expect("save should succeed");

    let query = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .filter(MEMBER.age.eq(100))
        .order_by(MEMBER.age.desc())
        .order_by(MEMBER.username.asc().nulls_last());

    assert_eq!(
        names(repo.session(), query),
        [text("member5"), text("member6"), None]
    );
}

#[test]
fn paging_with_total() {
    let store = seeded();
    let query = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .order_by(MEMBER.username.desc())
        .offset(1)
        .limit(2)
        .build()
        .expect("query should build")
        .scalars::<String>()
        .expect("text column");

    let results = Session::new(&store)
        .fetch_results(&query)
        .expect("query should execute");

    assert_eq!(results.total, 4);
    assert_eq!(results.limit, Some(2));
    assert_eq!(results.offset, 1);
    assert_eq!(results.results, ["member3", "member2"]);
}

#[test]
fn aggregation_over_all_members() {
    let store = seeded();
    let query = Query::select((
        MEMBER.source.count(),
        MEMBER.age.sum(),
        MEMBER.age.avg(),
        MEMBER.age.max(),
        MEMBER.age.min(),
    ))
    .from(MEMBER.source)
    .build()
    .expect("query should build")
    .tuples()
    .expect("tuple projection");

    let row = Session::new(&store)
        .fetch_one(&query)
        .expect("query should execute")
        .expect("one aggregate row");

    assert_eq!(row.get("count(*)"), Some(&Value::Int(4)));
    assert_eq!(row.get("sum(member.age)"), Some(&Value::Int(100)));
    assert_eq!(row.get("avg(member.age)"), Some(&Value::float(25.0)));
    assert_eq!(row.get("max(member.age)"), Some(&Value::Int(40)));
    assert_eq!(row.get("min(member.age)"), Some(&Value::Int(10)));
}

#[test]
fn average_age_per_team_truncates_into_integer_target() {
    let store = seeded();
    let query = Query::select((TEAM.name, MEMBER.age.avg()))
        .from(MEMBER.source)
        .join_to(MEMBER.team(), TEAM.source)
        .group_by(TEAM.name)
        .build()
        .expect("query should build")
        .constructor::<MemberDto>()
        .expect("avg binds to an integer field");

    let rows = Session::new(&store)
        .fetch(&query)
        .expect("query should execute");

    assert_eq!(
        rows,
        [MemberDto::new("teamA", 15), MemberDto::new("teamB", 35)]
    );
}

#[test]
fn inner_join_filtered_by_team() {
    let store = seeded();
    let query = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .join_to(MEMBER.team(), TEAM.source)
        .filter(TEAM.name.eq("teamA"));

    assert_eq!(
        names(&Session::new(&store), query),
        [text("member1"), text("member2")]
    );
}

#[test]
fn theta_join_matches_names_across_sources() {
    let store = seeded();
    let repo = MemberRepository::new(&store);
    for name in ["teamA", "teamB", "teamC"] {
        repo.save(Member::new(name, 0)).expect("save should succeed");
    }

    let query = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .from(TEAM.source)
        .filter(MEMBER.username.eq_expr(TEAM.name));

    assert_eq!(
        names(repo.session(), query),
        [text("teamA"), text("teamB")]
    );
}

#[test]
fn subquery_with_independent_alias() {
    let store = seeded();
    let sub = QMember::new("memberSub");
    let average = Query::select(sub.age.avg())
        .from(sub.source)
        .build()
        .expect("subquery should build");

    let query = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .filter(MEMBER.age.goe_expr(average));

    assert_eq!(
        names(&Session::new(&store), query),
        [text("member3"), text("member4")]
    );
}

#[test]
fn user_dto_with_alias_and_subquery_column() {
    let store = seeded();
    let sub = QMember::new("memberSub");
    let oldest = Query::select(sub.age.max())
        .from(sub.source)
        .build()
        .expect("subquery should build");

    let query = Query::select((
        MEMBER.username.as_("name"),
        Expr::subquery(oldest).as_("age"),
    ))
    .from(MEMBER.source)
    .build()
    .expect("query should build")
    .bean::<UserDto>()
    .expect("labels match UserDto properties");

    let users = Session::new(&store)
        .fetch(&query)
        .expect("query should execute");

    assert_eq!(users.len(), 4);
    assert!(users.iter().all(|user| user.age == 40));
    assert_eq!(users[0].name.as_deref(), Some("member1"));
}

#[test]
fn member_dto_by_setter_and_by_constructor_agree() {
    let store = seeded();
    let session = Session::new(&store);
    let spec = Query::select((MEMBER.username, MEMBER.age))
        .from(MEMBER.source)
        .build()
        .expect("query should build");

    let by_setter = session
        .fetch(&spec.clone().bean::<MemberDto>().expect("bean binds"))
        .expect("query should execute");
    let by_constructor = session
        .fetch(&spec.constructor::<MemberDto>().expect("constructor binds"))
        .expect("query should execute");

    assert_eq!(by_setter, by_constructor);
    assert_eq!(by_setter[0], MemberDto::new("member1", 10));
}

#[test]
fn case_expressions() {
    let store = seeded();
    let session = Session::new(&store);

    let simple = Query::select(
        MEMBER
            .age
            .when(10)
            .then("ten")
            .when(20)
            .then("twenty")
            .otherwise("other"),
    )
    .from(MEMBER.source);
    assert_eq!(
        names(&session, simple),
        [text("ten"), text("twenty"), text("other"), text("other")]
    );

    let searched = Query::select(
        CaseBuilder::new()
            .when(MEMBER.age.between(0, 20))
            .then("0-20")
            .when(MEMBER.age.between(21, 30))
            .then("21-30")
            .otherwise("other"),
    )
    .from(MEMBER.source);
    assert_eq!(
        names(&session, searched),
        [text("0-20"), text("0-20"), text("21-30"), text("other")]
    );
}

#[test]
fn concat_and_string_functions() {
    let store = seeded();
    let session = Session::new(&store);

    let concat = Query::select(
        MEMBER
            .username
            .concat("_")
            .concat(MEMBER.age.string_value()),
    )
    .from(MEMBER.source)
    .filter(MEMBER.username.eq("member1"));
    assert_eq!(names(&session, concat), [text("member1_10")]);

    let replaced = Query::select(MEMBER.username.expr().replace("member", "M"))
        .from(MEMBER.source)
        .order_by(MEMBER.id.asc())
        .limit(2);
    assert_eq!(names(&session, replaced), [text("M1"), text("M2")]);

    let lowered = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .filter(MEMBER.username.eq_expr(MEMBER.username.lower()));
    assert_eq!(names(&session, lowered).len(), 4);
}

#[test]
fn dynamic_where_params() {
    let store = seeded();
    let session = Session::new(&store);
    let username: Option<&str> = Some("member1");
    let age: Option<i32> = Some(10);

    let query = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .filter_all([
            username.map(|name| MEMBER.username.eq(name)),
            age.map(|years| MEMBER.age.eq(years)),
        ]);
    assert_eq!(names(&session, query), [text("member1")]);

    let mut builder = ConditionBuilder::new();
    builder.and(username.map(|name| MEMBER.username.eq(name)));
    builder.and(None::<Predicate>);

    let query = Query::select(MEMBER.username)
        .from(MEMBER.source)
        .filter_opt(builder.build());
    assert_eq!(names(&session, query), [text("member1")]);
}

#[test]
fn bulk_multiply_then_delete() {
    let store = seeded();
    let session = Session::new(&store);

    let doubled = Update::table(MEMBER.source)
        .set_expr(MEMBER.age, MEMBER.age.multiply(2))
        .build()
        .expect("update should build");
    assert_eq!(session.update(&doubled).expect("update should run"), 4);

    let purge = Delete::from(MEMBER.source)
        .filter(MEMBER.age.gt(18))
        .build()
        .expect("delete should build");
    assert_eq!(session.delete(&purge).expect("delete should run"), 4);

    let remaining = Query::select_from(MEMBER.source)
        .build()
        .expect("query should build")
        .rows()
        .expect("row projection");
    assert!(
        session
            .fetch(&remaining)
            .expect("query should execute")
            .is_empty()
    );
}
