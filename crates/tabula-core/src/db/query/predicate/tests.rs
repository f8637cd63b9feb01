use super::*;
use crate::{
    db::{executor::matches_row, query::Expr, row::Row},
    test_fixtures::{age, member, username},
};
use proptest::prelude::*;

fn member_row(name: Option<&str>, years: Option<i32>) -> Row {
    Row::new()
        .with("id", 1)
        .with("username", name)
        .with("age", years)
        .with("team_id", Option::<i64>::None)
}

fn matches(row: &Row, predicate: &Predicate) -> bool {
    matches_row(member(), row, predicate).expect("predicate should evaluate")
}

#[test]
fn and_with_absent_operand_is_the_other_operand() {
    let p = age(member()).eq(10);

    assert_eq!(and(None, Some(p.clone())), p);
    assert_eq!(and(Some(p.clone()), None), p);
    assert_eq!(or(None, Some(p.clone())), p);
}

#[test]
fn all_absent_operands_match_everything() {
    assert_eq!(and(None, None), Predicate::True);
    assert_eq!(or(None, None), Predicate::True);
}

#[test]
fn and_flattens_nested_conjunctions() {
    let m = member();
    let combined = age(m).gt(1).and(age(m).lt(9)).and(username(m).eq("x"));

    let Predicate::And(children) = combined else {
        panic!("expected a flattened conjunction");
    };
    assert_eq!(children.len(), 3);
}

#[test]
fn and_drops_true_operands() {
    let p = age(member()).eq(10);

    assert_eq!(Predicate::True.and(p.clone()), p);
    assert_eq!(Predicate::all([Predicate::True, p.clone()]), p);
}

#[test]
fn not_cancels_itself() {
    let p = age(member()).eq(10);

    assert_eq!(!!p.clone(), p);
    assert_eq!(!Predicate::True, Predicate::False);
}

#[test]
fn operators_compose_like_methods() {
    let m = member();
    let a = age(m).goe(20);
    let b = username(m).eq("member1");

    assert_eq!(&a & &b, a.clone().and(b.clone()));
    assert_eq!(a.clone() | b.clone(), a.or(b));
}

#[test]
fn condition_builder_starts_empty() {
    let builder = ConditionBuilder::new();

    assert!(!builder.has_value());
    assert_eq!(builder.build(), None);
}

#[test]
fn condition_builder_skips_absent_conditions() {
    let m = member();
    let absent: Option<Predicate> = None;
    let mut builder = ConditionBuilder::new();
    builder
        .and(absent.clone())
        .and(username(m).eq("member1"))
        .and(absent)
        .and(age(m).eq(10));

    assert_eq!(
        builder.build(),
        Some(username(m).eq("member1").and(age(m).eq(10)))
    );
}

#[test]
fn condition_builder_or_with_seed() {
    let m = member();
    let mut builder = ConditionBuilder::with(age(m).eq(10));
    builder.or(age(m).eq(40));

    let row = member_row(Some("member4"), Some(40));
    let predicate = builder.build().expect("builder should hold a condition");
    assert!(matches(&row, &predicate));
}

#[test]
fn optional_chain_stays_absent_when_every_part_is_absent() {
    let none: Option<Predicate> = None;

    assert_eq!(none.clone().and_opt(None), None);
    assert_eq!(none.or_opt(None), None);
}

#[test]
fn comparison_against_null_column_never_matches() {
    let m = member();
    let row = member_row(None, None);

    assert!(!matches(&row, &username(m).eq("member1")));
    assert!(!matches(&row, &username(m).ne("member1")));
    assert!(!matches(&row, &!username(m).eq("member1")));
    assert!(matches(&row, &username(m).is_null()));
}

#[test]
fn between_is_inclusive() {
    let m = member();
    let predicate = age(m).between(21, 30);

    assert!(!matches(&member_row(None, Some(20)), &predicate));
    assert!(matches(&member_row(None, Some(21)), &predicate));
    assert!(matches(&member_row(None, Some(30)), &predicate));
    assert!(!matches(&member_row(None, Some(31)), &predicate));
}

#[test]
fn string_matchers() {
    let m = member();
    let row = member_row(Some("member12"), Some(10));

    assert!(matches(&row, &username(m).like("mem%1_")));
    assert!(matches(&row, &username(m).contains("ber1")));
    assert!(matches(&row, &username(m).starts_with("member")));
    assert!(matches(&row, &username(m).ends_with("12")));
    assert!(!matches(&row, &username(m).like("MEMBER%")));
    assert!(matches(&row, &username(m).expr().like_ignore_case("MEMBER%")));
}

#[test]
fn substring_matchers_treat_wildcards_literally() {
    let m = member();
    let percent = member_row(Some("100%"), Some(10));
    let underscore = member_row(Some("member_1"), Some(10));
    let plain = member_row(Some("memberX1"), Some(10));

    assert!(matches(&percent, &username(m).contains("%")));
    assert!(!matches(&plain, &username(m).contains("%")));
    assert!(matches(&underscore, &username(m).contains("member_1")));
    assert!(!matches(&plain, &username(m).contains("member_1")));
    assert!(!matches(&plain, &username(m).starts_with("member_")));
    assert!(matches(&percent, &username(m).ends_with("0%")));
    assert!(!matches(&plain, &username(m).ends_with("_1")));

    // plain like keeps its wildcards
    assert!(matches(&plain, &username(m).like("member_1")));
}

#[test]
fn in_list_with_null_member_is_unknown_when_missing() {
    let m = member();
    let row = member_row(Some("x"), Some(10));
    let list = age(m)
        .expr()
        .not_in([Expr::literal(20), Expr::null()]);

    // 10 NOT IN (20, NULL) is unknown, so the row is dropped
    assert!(!matches(&row, &list));
    assert!(matches(&row, &age(m).in_list([10, 20])));
}

fn arb_predicate() -> impl Strategy<Value = Option<Predicate>> {
    let m = member();
    prop_oneof![
        Just(None),
        (0..50i32).prop_map(move |v| Some(age(m).eq(v))),
        (0..50i32).prop_map(move |v| Some(age(m).goe(v))),
        (0..50i32).prop_map(move |v| Some(age(m).lt(v))),
        Just(Some(username(m).is_null())),
        Just(Some(username(m).starts_with("member"))),
    ]
}

fn arb_row() -> impl Strategy<Value = Row> {
    (
        prop::option::of("(member|user)[0-9]"),
        prop::option::of(0..50i32),
    )
        .prop_map(|(name, years)| member_row(name.as_deref(), years))
}

proptest! {
    #[test]
    fn null_elision_law(p in arb_predicate(), q in arb_predicate(), row in arb_row()) {
        let eval = |predicate: &Option<Predicate>| {
            predicate.as_ref().is_none_or(|predicate| matches(&row, predicate))
        };

        // absent operands constrain nothing
        prop_assert_eq!(matches(&row, &and(p.clone(), q.clone())), eval(&p) && eval(&q));

        match (&p, &q) {
            (Some(_), Some(_)) => {
                prop_assert_eq!(matches(&row, &or(p.clone(), q.clone())), eval(&p) || eval(&q));
            }
            (Some(only), None) | (None, Some(only)) => {
                prop_assert_eq!(or(p.clone(), q.clone()), only.clone());
            }
            (None, None) => prop_assert!(matches(&row, &or(None, None))),
        }
    }

    #[test]
    fn condition_builder_agrees_with_and(p in arb_predicate(), q in arb_predicate()) {
        let mut builder = ConditionBuilder::new();
        builder.and(p.clone()).and(q.clone());

        match builder.build() {
            Some(built) => prop_assert_eq!(built, and(p, q)),
            None => prop_assert!(p.is_none() && q.is_none()),
        }
    }
}
