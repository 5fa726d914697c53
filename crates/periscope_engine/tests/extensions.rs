//! Fault isolation and context propagation for extension hooks.


use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use periscope_context::Context;
use periscope_engine::extension::{
    execution_finish, parse_finish, resolve_field_finish, validation_finish,
};
use periscope_engine::{Phase, Request, Response};
use periscope_query::{Location, PathSegment};
use serde_json::{Map, json};
use test_utils::*;

fn run_with(ext: TestExtension) -> Response {
    let mut schema = simple_schema();
    schema.add_extension(ext);
    run(&schema, "query Example { a }")
}

fn aborted(phase: Phase) -> Response {
    Response {
        data: None,
        errors: vec![phase_error("testExt", phase)],
        extensions: None,
    }
}

fn degraded(phase: Phase) -> Response {
    Response {
        data: Some(json!({ "a": "foo" })),
        errors: vec![phase_error("testExt", phase)],
        extensions: None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ABORTING PHASES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn init_panic_aborts() {
    let ext = TestExtension::new("testExt").on_init(|_, _| panic!("test error"));
    assert_eq!(run_with(ext), aborted(Phase::Init));
}

#[test]
fn parse_did_start_panic_aborts() {
    let ext = TestExtension::new("testExt").on_parse(|_| panic!("test error"));
    assert_eq!(run_with(ext), aborted(Phase::ParseDidStart));
}

#[test]
fn parse_finish_panic_aborts() {
    let ext = TestExtension::new("testExt").on_parse(|ctx| {
        (ctx.clone(), parse_finish(|_| panic!("test error")))
    });
    assert_eq!(run_with(ext), aborted(Phase::ParseFinishFunc));
}

#[test]
fn validation_did_start_panic_aborts() {
    let ext = TestExtension::new("testExt").on_validation(|_| panic!("test error"));
    assert_eq!(run_with(ext), aborted(Phase::ValidationDidStart));
}

#[test]
fn validation_finish_panic_aborts() {
    let ext = TestExtension::new("testExt").on_validation(|ctx| {
        (ctx.clone(), validation_finish(|_| panic!("test error")))
    });
    assert_eq!(run_with(ext), aborted(Phase::ValidationFinishFunc));
}

#[test]
fn execution_did_start_panic_aborts() {
    let ext = TestExtension::new("testExt").on_execution(|_| panic!("test error"));
    assert_eq!(run_with(ext), aborted(Phase::ExecutionDidStart));
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEGRADING PHASES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn execution_finish_panic_keeps_data() {
    let ext = TestExtension::new("testExt").on_execution(|ctx| {
        (ctx.clone(), execution_finish(|_| panic!("test error")))
    });
    assert_eq!(run_with(ext), degraded(Phase::ExecutionFinishFunc));
}

#[test]
fn resolve_field_did_start_panic_keeps_data() {
    let ext = TestExtension::new("testExt").on_resolve_field(|_, _| panic!("test error"));
    assert_eq!(run_with(ext), degraded(Phase::ResolveFieldDidStart));
}

#[test]
fn resolve_field_finish_panic_keeps_data() {
    let ext = TestExtension::new("testExt").on_resolve_field(|ctx, _| {
        (ctx.clone(), resolve_field_finish(|_| panic!("test error")))
    });
    assert_eq!(run_with(ext), degraded(Phase::ResolveFieldFinishFunc));
}

#[test]
fn get_result_panic_keeps_data_and_an_empty_extensions_map() {
    let ext = TestExtension::new("testExt")
        .on_has_result(|| true)
        .on_get_result(|_| panic!("test error"));

    let expected = Response {
        extensions: Some(Map::new()),
        ..degraded(Phase::GetResult)
    };
    let response = run_with(ext);
    assert_eq!(response, expected);
    assert_eq!(
        serde_json::to_value(&response).unwrap()["extensions"],
        json!({})
    );
}

#[test]
fn boxed_error_panics_report_the_error_message() {
    let ext = TestExtension::new("testExt").on_init(|_, _| {
        let err: periscope_query::BoxError = "test error".into();
        std::panic::panic_any(err)
    });
    assert_eq!(run_with(ext), aborted(Phase::Init));
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTEXT PROPAGATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
struct CtxPath(Vec<String>);

#[test]
fn field_context_reaches_children_but_not_siblings() {
    let trace: Arc<Mutex<BTreeMap<String, usize>>> = Arc::default();
    let recorded = Arc::clone(&trace);

    let ext = TestExtension::new("testExt").on_resolve_field(move |ctx, info| {
        let mut path = ctx.get::<CtxPath>().map(|p| p.0.clone()).unwrap_or_default();
        path.push(info.field_name.clone());
        *recorded.lock().entry(path.join(".")).or_default() += 1;
        (ctx.with(CtxPath(path)), noop_field_finish())
    });

    let mut schema = nested_schema();
    schema.add_extension(ext);
    let response = schema.execute_sync(
        Request::new("query { a { foo bar baz } b { foo bar baz } }")
            .with_context(Context::new().with(CtxPath(Vec::new()))),
    );

    assert_eq!(
        response,
        Response {
            data: Some(json!({
                "a": { "foo": "foo", "bar": "bar", "baz": "baz" },
                "b": [
                    { "foo": "foo", "bar": "bar", "baz": "baz" },
                    { "foo": "foo", "bar": "bar", "baz": "baz" },
                ],
            })),
            errors: Vec::new(),
            extensions: None,
        }
    );

    let expected: BTreeMap<String, usize> = [
        ("a", 1),
        ("a.bar", 1),
        ("a.baz", 1),
        ("a.foo", 1),
        ("b", 1),
        ("b.bar", 2),
        ("b.baz", 2),
        ("b.foo", 2),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v))
    .collect();
    assert_eq!(*trace.lock(), expected);
}

#[test]
fn resolver_receives_the_field_context() {
    struct Marker(&'static str);

    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&seen);

    let query = periscope_query::ObjectType::new("Query").field(
        "a",
        periscope_query::Field::new("String").resolve(move |params| {
            let marker = params.context.get::<Marker>().map_or("none", |m| m.0);
            sink.lock().push(marker.to_owned());
            Ok(json!(marker))
        }),
    );
    let mut schema = periscope_engine::Schema::new(
        periscope_query::TypeSystem::build(query).finish().unwrap(),
    );
    schema.add_extension(
        TestExtension::new("marker")
            .on_resolve_field(|ctx, _| (ctx.with(Marker("field")), noop_field_finish())),
    );

    let response = run(&schema, "{ a }");
    assert_eq!(response.data, Some(json!({ "a": "field" })));
    assert_eq!(*seen.lock(), vec!["field"]);
}

#[test]
fn phase_contexts_carry_forward_to_later_stages() {
    struct FromInit;
    struct FromParse;

    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    let validation_seen = Arc::clone(&seen);
    let field_seen = Arc::clone(&seen);

    let ext = TestExtension::new("testExt")
        .on_init(|ctx, _| ctx.with(FromInit))
        .on_parse(|ctx| (ctx.with(FromParse), noop_parse_finish()))
        .on_validation(move |ctx| {
            if ctx.contains::<FromInit>() && ctx.contains::<FromParse>() {
                validation_seen.lock().push("validation");
            }
            (ctx.clone(), noop_validation_finish())
        })
        .on_resolve_field(move |ctx, _| {
            if ctx.contains::<FromInit>() && ctx.contains::<FromParse>() {
                field_seen.lock().push("field");
            }
            (ctx.clone(), noop_field_finish())
        });

    run_with(ext);
    assert_eq!(*seen.lock(), vec!["validation", "field"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR PROPAGATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn resolver_errors_carry_path_and_location() {
    struct Key;

    let finished: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&finished);

    let ext = TestExtension::new("testExt").on_resolve_field(move |ctx, _| {
        let sink = Arc::clone(&sink);
        let finish = resolve_field_finish(move |result| {
            if let Err(err) = result {
                sink.lock().push(err.to_string());
            }
        });
        (ctx.with(Key), finish)
    });

    let mut schema = failing_schema();
    schema.add_extension(ext);
    let response = run(&schema, "query { a { foo bar baz } }");

    assert_eq!(response.data, Some(json!({ "a": null })));
    assert_eq!(response.errors.len(), 1);
    let error = &response.errors[0];
    assert_eq!(error.message, "test error");
    assert_eq!(error.locations, vec![Location::new(1, 9)]);
    assert_eq!(error.path, vec![PathSegment::from("a")]);
    assert_eq!(
        error.original_error().map(ToString::to_string),
        Some("test error".to_owned())
    );
    assert_eq!(*finished.lock(), vec!["test error"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDERING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn zero_extensions_match_the_baseline() {
    let response = run(&simple_schema(), "query Example { a }");
    assert_eq!(
        response,
        Response {
            data: Some(json!({ "a": "foo" })),
            errors: Vec::new(),
            extensions: None,
        }
    );
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "data": { "a": "foo" } })
    );
}

#[test]
fn two_extensions_are_each_invoked_once_per_phase() {
    let log = EventLog::new();
    let mut schema = simple_schema();
    schema
        .add_extension(recording_extension("one", &log))
        .add_extension(recording_extension("two", &log));

    let response = run(&schema, "query Example { a }");
    assert_eq!(response.data, Some(json!({ "a": "foo" })));
    assert_eq!(
        log.events(),
        vec![
            "one:init",
            "two:init",
            "one:parse",
            "two:parse",
            "one:parse:finish",
            "two:parse:finish",
            "one:validation",
            "two:validation",
            "one:validation:finish",
            "two:validation:finish",
            "one:execution",
            "two:execution",
            "one:field:a",
            "two:field:a",
            "one:field:a:finish",
            "two:field:a:finish",
            "one:execution:finish",
            "two:execution:finish",
        ]
    );
}

#[test]
fn a_faulting_extension_does_not_starve_its_neighbour() {
    let log = EventLog::new();
    let mut schema = simple_schema();
    schema
        .add_extension(TestExtension::new("broken").on_resolve_field(|_, _| panic!("test error")))
        .add_extension(recording_extension("healthy", &log));

    let response = run(&schema, "query Example { a }");
    assert_eq!(response.data, Some(json!({ "a": "foo" })));
    assert_eq!(
        response.errors,
        vec![phase_error("broken", Phase::ResolveFieldDidStart)]
    );
    assert_eq!(log.count("healthy:field:a"), 1);
    assert_eq!(log.count("healthy:field:a:finish"), 1);
}

#[test]
fn abort_skips_later_stages() {
    let log = EventLog::new();
    let mut schema = simple_schema();
    schema
        .add_extension(recording_extension("observer", &log))
        .add_extension(TestExtension::new("broken").on_validation(|_| panic!("test error")));

    let response = run(&schema, "query Example { a }");
    assert_eq!(response, {
        let mut expected = aborted(Phase::ValidationDidStart);
        expected.errors = vec![phase_error("broken", Phase::ValidationDidStart)];
        expected
    });
    assert_eq!(log.count("observer:validation"), 1);
    assert_eq!(log.count("observer:validation:finish"), 0);
    assert_eq!(log.count("observer:execution"), 0);
}

#[test]
fn results_from_several_extensions_are_keyed_by_name() {
    let mut schema = simple_schema();
    schema
        .add_extension(
            TestExtension::new("first")
                .on_has_result(|| true)
                .on_get_result(|_| json!({ "n": 1 })),
        )
        .add_extension(TestExtension::new("silent"))
        .add_extension(
            TestExtension::new("second")
                .on_has_result(|| true)
                .on_get_result(|_| json!([2])),
        );

    let response = run(&schema, "{ a }");
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "data": { "a": "foo" },
            "extensions": { "first": { "n": 1 }, "second": [2] },
        })
    );
}

#[test]
fn shared_extensions_can_be_added_in_bulk() {
    let log = EventLog::new();
    let mut schema = simple_schema();
    schema.add_extensions([
        Arc::new(recording_extension("one", &log)) as Arc<dyn periscope_engine::Extension>,
        Arc::new(recording_extension("two", &log)) as Arc<dyn periscope_engine::Extension>,
    ]);
    assert_eq!(schema.extensions().names().collect::<Vec<_>>(), vec!["one", "two"]);

    run(&schema, "{ a }");
    assert_eq!(log.count("one:init"), 1);
    assert_eq!(log.count("two:init"), 1);
}
