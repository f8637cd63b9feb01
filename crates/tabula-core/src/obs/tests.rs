use super::*;
use crate::{
    db::{
        Session,
        query::{Delete, Query, Update},
    },
    test_fixtures::{age, member, seeded_store, team, team_id, team_name, username},
};

fn source_counters<'a>(report: &'a EventReport, source: &str) -> &'a SourceCounters {
    &report
        .source_counters
        .iter()
        .find(|summary| summary.source == source)
        .unwrap_or_else(|| panic!("no counters for {source}"))
        .counters
}

#[test]
fn load_records_calls_and_rows() {
    metrics_reset_all();
    let store = seeded_store();
    let m = member();
    let query = Query::select(username(m))
        .from(m)
        .filter(age(m).gt(15))
        .build()
        .expect("query should build")
        .tuples()
        .expect("tuple projection should be accepted");

    let rows = Session::new(&store)
        .fetch(&query)
        .expect("query should execute");
    assert_eq!(rows.len(), 3);

    let report = metrics_report();
    assert_eq!(report.counters.load_calls, 1);
    assert_eq!(report.counters.rows_scanned, 4);
    assert_eq!(report.counters.rows_loaded, 3);

    let summary = report
        .source_counters
        .iter()
        .find(|summary| summary.source == "member")
        .expect("member summary should exist");
    assert!((summary.avg_rows_per_load - 3.0).abs() < f64::EPSILON);
}

#[test]
fn count_and_join_are_recorded_separately() {
    metrics_reset_all();
    let store = seeded_store();
    let (m, t) = (member(), team());
    let query = Query::select((team_name(t), m.count()))
        .from(m)
        .join(t, team_id(m).eq_expr(t.column::<i64>("id")))
        .group_by(team_name(t))
        .build()
        .expect("query should build")
        .tuples()
        .expect("tuple projection should be accepted");

    let count = Session::new(&store)
        .fetch_count(&query)
        .expect("count should execute");
    assert_eq!(count, 2);

    let report = metrics_report();
    assert_eq!(report.counters.count_calls, 1);
    assert_eq!(report.counters.load_calls, 0);
    assert_eq!(report.counters.rows_joined, 4);
    assert_eq!(report.counters.groups_built, 2);

    // scans are attributed to the scanned source, not the root
    assert_eq!(source_counters(&report, "team").rows_scanned, 2);
    assert_eq!(source_counters(&report, "member").rows_scanned, 4);
}

#[test]
fn mutations_record_touched_rows() {
    metrics_reset_all();
    let store = seeded_store();
    let m = member();
    let session = Session::new(&store);

    let update = Update::table(m)
        .set(age(m), 1)
        .filter(age(m).lt(25))
        .build()
        .expect("update should build");
    session.update(&update).expect("update should run");

    let delete = Delete::from(m)
        .filter(age(m).eq(1))
        .build()
        .expect("delete should build");
    session.delete(&delete).expect("delete should run");

    let counters = source_counters(&metrics_report(), "member").clone();
    assert_eq!(counters.update_calls, 1);
    assert_eq!(counters.rows_updated, 2);
    assert_eq!(counters.delete_calls, 1);
    assert_eq!(counters.rows_deleted, 2);
}

#[test]
fn noop_sink_leaves_counters_untouched() {
    metrics_reset_all();
    let store = seeded_store();
    let query = Query::select_from(member())
        .build()
        .expect("query should build")
        .tuples()
        .expect("tuple projection should be accepted");

    Session::new(&store)
        .metrics_sink(&NoopMetricsSink)
        .fetch(&query)
        .expect("query should execute");

    assert_eq!(metrics_report().counters, EventOps::default());
}

#[test]
fn custom_sink_sees_exec_start_and_finish() {
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording(RefCell<Vec<MetricsEvent>>);

    impl MetricsSink for Recording {
        fn record(&self, event: MetricsEvent) {
            self.0.borrow_mut().push(event);
        }
    }

    let sink = Recording::default();
    let store = seeded_store();
    let query = Query::select_from(member())
        .limit(1)
        .build()
        .expect("query should build")
        .tuples()
        .expect("tuple projection should be accepted");

    Session::new(&store)
        .metrics_sink(&sink)
        .fetch(&query)
        .expect("query should execute");

    let events = sink.0.into_inner();
    assert_eq!(
        events.first(),
        Some(&MetricsEvent::ExecStart {
            kind: ExecKind::Load,
            source: "member",
        })
    );
    assert_eq!(
        events.last(),
        Some(&MetricsEvent::ExecFinish {
            kind: ExecKind::Load,
            source: "member",
            rows_touched: 1,
        })
    );
}
