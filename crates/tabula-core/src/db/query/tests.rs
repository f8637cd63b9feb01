use super::*;
use crate::{
    test_fixtures::{age, id, member, member_alias, team, team_id, team_name, username},
    value::{Value, ValueConversionError, ValueKind},
};

fn plan_error(result: Result<QuerySpec, QueryError>) -> PlanError {
    match result {
        Err(QueryError::Plan(err)) => err,
        other => panic!("expected a plan error, got {other:?}"),
    }
}

fn projection_error<P: Projector>(result: Result<TypedQuery<P>, QueryError>) -> ProjectionError {
    match result {
        Err(QueryError::Projection(err)) => err,
        Err(other) => panic!("expected a projection error, got {other:?}"),
        Ok(_) => panic!("expected a projection error, got a typed query"),
    }
}

fn team_relation() -> Relation {
    Relation::new(team_id(member()).column_ref(), "id")
}

//
// Build
//

#[test]
fn negative_offset_is_invalid_range() {
    let err = plan_error(Query::select_from(member()).offset(-1).build());

    assert_eq!(
        err,
        PlanError::InvalidRange {
            field: "offset",
            value: -1
        }
    );
}

#[test]
fn negative_limit_is_invalid_range() {
    let err = plan_error(Query::select_from(member()).limit(-5).build());

    assert_eq!(
        err,
        PlanError::InvalidRange {
            field: "limit",
            value: -5
        }
    );
}

#[test]
fn zero_limit_builds() {
    let spec = Query::select_from(member())
        .limit(0)
        .build()
        .expect("limit 0 should build");

    assert_eq!(spec.page().limit, Some(0));
    assert!(spec.page().is_windowed());
}

#[test]
fn missing_select_is_rejected() {
    let err = plan_error(Query::new().from(member()).build());

    assert_eq!(err, PlanError::MissingSelect);
}

#[test]
fn missing_source_is_rejected() {
    let err = plan_error(Query::select(username(member())).build());

    assert_eq!(err, PlanError::MissingSource);
}

#[test]
fn duplicate_alias_is_rejected() {
    let err = plan_error(
        Query::select(username(member()))
            .from(member())
            .from(member())
            .build(),
    );

    assert_eq!(err, PlanError::DuplicateAlias { alias: "member" });
}

#[test]
fn distinct_aliases_over_one_model_build() {
    let sub = member_alias("memberSub");

    Query::select(username(member()))
        .from(member())
        .from(sub)
        .filter(age(member()).eq_expr(age(sub)))
        .build()
        .expect("aliased self cross product should build");
}

#[test]
fn unknown_column_is_unresolved() {
    let err = plan_error(
        Query::select_from(member())
            .filter(member().column::<String>("nickname").eq("x"))
            .build(),
    );

    assert_eq!(
        err,
        PlanError::UnresolvedColumn {
            column: "member.nickname".to_string(),
            clause: "where",
        }
    );
}

#[test]
fn column_of_source_outside_scope_is_unresolved() {
    let err = plan_error(Query::select(team_name(team())).from(member()).build());

    assert_eq!(
        err,
        PlanError::UnresolvedColumn {
            column: "team.name".to_string(),
            clause: "select",
        }
    );
}

#[test]
fn join_predicate_cannot_see_later_joins() {
    let other = member_alias("other");
    let err = plan_error(
        Query::select_from(member())
            .join(team(), team_id(member()).eq_expr(id(team())).and(age(other).gt(1)))
            .join(other, id(other).eq_expr(id(member())))
            .build(),
    );

    assert_eq!(
        err,
        PlanError::UnresolvedColumn {
            column: "other.age".to_string(),
            clause: "join",
        }
    );
}

#[test]
fn on_without_join_is_dangling() {
    let err = plan_error(
        Query::select_from(member())
            .on(age(member()).gt(1))
            .build(),
    );

    assert_eq!(err, PlanError::DanglingJoinModifier { modifier: "on" });
}

#[test]
fn fetch_join_without_join_is_dangling() {
    let err = plan_error(Query::select_from(member()).fetch_join().build());

    assert_eq!(
        err,
        PlanError::DanglingJoinModifier {
            modifier: "fetch_join"
        }
    );
}

#[test]
fn on_extends_the_last_join() {
    let spec = Query::select_from(member())
        .left_join_to(team_relation(), team())
        .on(team_name(team()).eq("teamA"))
        .build()
        .expect("join with extra condition should build");

    let join = &spec.joins()[0];
    assert_eq!(join.kind, JoinKind::Left);
    assert_eq!(
        join.on,
        team_id(member())
            .eq_expr(id(team()))
            .and(team_name(team()).eq("teamA"))
    );
}

#[test]
fn aggregate_in_where_is_rejected() {
    let err = plan_error(
        Query::select(username(member()))
            .from(member())
            .filter(age(member()).avg().gt(10))
            .build(),
    );

    assert!(matches!(
        err,
        PlanError::AggregateInFilter { clause: "where", .. }
    ));
}

#[test]
fn nested_aggregate_is_rejected() {
    let err = plan_error(
        Query::select(age(member()).max().sum())
            .from(member())
            .build(),
    );

    assert!(matches!(err, PlanError::NestedAggregate { .. }));
}

#[test]
fn bare_column_with_aggregate_is_ambiguous() {
    let err = plan_error(
        Query::select((username(member()), age(member()).avg()))
            .from(member())
            .build(),
    );

    assert_eq!(
        err,
        PlanError::AmbiguousGroupKey {
            column: "member.username".to_string()
        }
    );
}

#[test]
fn grouped_column_is_not_ambiguous() {
    let spec = Query::select((team_name(team()), age(member()).avg()))
        .from(member())
        .join_to(team_relation(), team())
        .group_by(team_name(team()))
        .build()
        .expect("grouped select should build");

    assert!(spec.is_grouped());
}

#[test]
fn whole_row_select_with_grouping_is_ambiguous() {
    let err = plan_error(
        Query::select_from(member())
            .group_by(team_id(member()))
            .build(),
    );

    assert!(matches!(err, PlanError::AmbiguousGroupKey { .. }));
}

#[test]
fn having_on_ungrouped_column_is_ambiguous() {
    let err = plan_error(
        Query::select(team_id(member()))
            .from(member())
            .group_by(team_id(member()))
            .having(age(member()).gt(10))
            .build(),
    );

    assert_eq!(
        err,
        PlanError::AmbiguousGroupKey {
            column: "member.age".to_string()
        }
    );
}

#[test]
fn subquery_must_select_one_column() {
    let sub = member_alias("memberSub");
    let subquery = Query::select((age(sub), username(sub)))
        .from(sub)
        .build()
        .expect("subquery should build on its own");

    let err = plan_error(
        Query::select_from(member())
            .filter(age(member()).eq_expr(subquery))
            .build(),
    );

    assert_eq!(err, PlanError::SubqueryColumns { found: 2 });
}

#[test]
fn in_subquery_must_select_one_column() {
    let sub = member_alias("memberSub");
    let subquery = Query::select_from(sub)
        .build()
        .expect("subquery should build on its own");

    let err = plan_error(
        Query::select_from(member())
            .filter(age(member()).in_subquery(subquery))
            .build(),
    );

    assert_eq!(err, PlanError::SubqueryColumns { found: 4 });
}

#[test]
fn filter_all_skips_absent_predicates() {
    let with_gaps = Query::select_from(member())
        .filter_all([None, Some(age(member()).gt(10)), None])
        .build()
        .expect("query should build");
    let direct = Query::select_from(member())
        .filter(age(member()).gt(10))
        .build()
        .expect("query should build");

    assert_eq!(with_gaps, direct);
}

#[test]
fn filter_all_with_only_absent_predicates_has_no_filter() {
    let spec = Query::select_from(member())
        .filter_all([None, None])
        .build()
        .expect("query should build");

    assert_eq!(spec.filter(), None);
}

#[test]
fn select_from_expands_to_model_columns() {
    let spec = Query::select_from(member())
        .build()
        .expect("query should build");
    let labels: Vec<String> = spec.select_items().iter().map(SelectItem::label).collect();

    assert_eq!(labels, ["id", "username", "age", "team_id"]);
}

//
// Expressions
//

#[test]
fn labels_follow_aliases_and_rendering() {
    let m = member();

    assert_eq!(SelectItem::new(username(m).expr()).label(), "username");
    assert_eq!(username(m).as_("name").label(), "name");
    assert_eq!(SelectItem::new(age(m).avg()).label(), "avg(member.age)");
    assert_eq!(SelectItem::new(Expr::count_all()).label(), "count(*)");
    assert_eq!(
        SelectItem::new(username(m).concat("_").concat(age(m).string_value())).label(),
        "concat(member.username, '_', str(member.age))"
    );
}

#[test]
fn concat_chains_flatten() {
    let m = member();
    let expr = username(m).concat("_").concat(age(m).string_value());

    let Expr::Func(FuncExpr::Concat(args)) = expr else {
        panic!("expected a concat expression");
    };
    assert_eq!(args.len(), 3);
}

#[test]
fn simple_case_builds_branches() {
    let m = member();
    let expr = age(m).when(10).then("ten").when(20).then("twenty").otherwise("other");

    let Expr::Case(case) = expr else {
        panic!("expected a case expression");
    };
    assert_eq!(case.branches.len(), 2);
    assert_eq!(*case.otherwise, Expr::literal("other"));
}

#[test]
fn output_kinds_follow_models_and_aggregates() {
    let m = member();
    let spec = Query::select((username(m), age(m).avg(), age(m).count(), age(m).sum()))
        .from(m)
        .group_by(username(m))
        .build()
        .expect("query should build");

    assert_eq!(
        spec.output_kinds(),
        vec![
            Some(ValueKind::Text),
            Some(ValueKind::Float),
            Some(ValueKind::Int),
            Some(ValueKind::Int),
        ]
    );
}

#[test]
fn arithmetic_kinds_widen_to_float() {
    let m = member();
    let spec = Query::select((age(m).add(1), age(m).add(1.5), Expr::null()))
        .from(m)
        .build()
        .expect("query should build");

    assert_eq!(
        spec.output_kinds(),
        vec![
            Some(ValueKind::Int),
            Some(ValueKind::Float),
            Some(ValueKind::Null),
        ]
    );
}

//
// Projection selection
//

#[derive(Debug, Default, PartialEq)]
struct NameAge {
    username: Option<String>,
    age: i32,
}

impl FromTuple for NameAge {
    type Args = (Option<String>, i32);

    fn from_args((username, age): Self::Args) -> Self {
        Self { username, age }
    }
}

impl Bean for NameAge {
    const PROPERTIES: &'static [(&'static str, ValueKind)] =
        &[("username", ValueKind::Text), ("age", ValueKind::Int)];

    fn set(&mut self, property: &str, value: Value) -> Result<(), ValueConversionError> {
        use crate::value::FromValue;

        match property {
            "username" => self.username = Option::<String>::from_value(value)?,
            "age" => self.age = i32::from_value(value)?,
            _ => {}
        }

        Ok(())
    }
}

#[test]
fn constructor_arity_mismatch_is_rejected_when_selected() {
    let spec = Query::select((username(member()), age(member()), id(member())))
        .from(member())
        .build()
        .expect("query should build");

    assert_eq!(
        projection_error(spec.constructor::<NameAge>()),
        ProjectionError::Arity {
            expected: 2,
            found: 3
        }
    );
}

#[test]
fn constructor_type_mismatch_is_rejected_when_selected() {
    let spec = Query::select((age(member()), username(member())))
        .from(member())
        .build()
        .expect("query should build");

    assert_eq!(
        projection_error(spec.constructor::<NameAge>()),
        ProjectionError::Type {
            position: 0,
            label: "age".to_string(),
            kind: ValueKind::Int,
        }
    );
}

#[test]
fn constructor_accepts_avg_into_integer_field() {
    let spec = Query::select((username(member()), age(member()).avg()))
        .from(member())
        .group_by(username(member()))
        .build()
        .expect("query should build");

    spec.constructor::<NameAge>()
        .expect("float result should bind to an integer field");
}

#[test]
fn bean_requires_known_labels() {
    let spec = Query::select((username(member()), age(member()).as_("years")))
        .from(member())
        .build()
        .expect("query should build");

    assert_eq!(
        projection_error(spec.bean::<NameAge>()),
        ProjectionError::UnknownProperty {
            property: "years".to_string()
        }
    );
}

#[test]
fn bean_binds_by_label_in_any_order() {
    let spec = Query::select((age(member()), username(member())))
        .from(member())
        .build()
        .expect("query should build");

    spec.bean::<NameAge>()
        .expect("bean projection binds by label");
}

#[test]
fn scalar_requires_single_column() {
    let spec = Query::select((username(member()), age(member())))
        .from(member())
        .build()
        .expect("query should build");

    assert_eq!(
        projection_error(spec.scalars::<String>()),
        ProjectionError::Arity {
            expected: 1,
            found: 2
        }
    );
}

#[test]
fn entity_projection_requires_whole_rows() {
    let spec = Query::select(username(member()))
        .from(member())
        .build()
        .expect("query should build");

    assert_eq!(
        projection_error(spec.entities()),
        ProjectionError::NotWholeRow
    );
}

//
// Mutation builders
//

#[test]
fn update_without_assignments_is_rejected() {
    let err = Update::table(member())
        .filter(age(member()).lt(28))
        .build()
        .expect_err("update without assignments should fail");

    assert!(matches!(err, QueryError::Plan(PlanError::EmptyAssignment)));
}

#[test]
fn update_cannot_reference_other_sources() {
    let err = Update::table(member())
        .set(username(member()), "x")
        .filter(team_name(team()).eq("teamA"))
        .build()
        .expect_err("update filter outside its source should fail");

    assert!(matches!(
        err,
        QueryError::Plan(PlanError::UnresolvedColumn { .. })
    ));
}

#[test]
fn delete_defaults_to_match_all() {
    let spec = Delete::from(member())
        .build()
        .expect("unfiltered delete should build");

    assert_eq!(spec.filter(), &Predicate::True);
}
