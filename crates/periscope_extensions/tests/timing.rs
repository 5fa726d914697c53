//! Timing reports produced through a real schema.

mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use periscope_engine::{Request, Schema};
use periscope_extensions::{MockClock, TIMING_VERSION, TimingExtension};
use periscope_query::schema::{Field, ObjectType, TypeSystem};
use periscope_query::Value;
use serde_json::json;
use test_utils::*;

const FIVE_MS: u64 = 5_000_000;

/// `slow: String` whose resolver advances `mock` by five milliseconds.
fn slow_schema(mock: &Arc<MockClock>) -> Schema {
    let mock = Arc::clone(mock);
    let query = ObjectType::new("Query")
        .field(
            "slow",
            Field::new("String").resolve(move |_| {
                mock.advance(Duration::from_nanos(FIVE_MS));
                Ok(json!("done"))
            }),
        )
        .field("fast", Field::new("String").resolve(|_| Ok(json!("done"))));
    Schema::new(TypeSystem::build(query).finish().unwrap())
}

fn timing(response: &periscope_engine::Response) -> &Value {
    &response.extensions.as_ref().expect("timing result")["timing"]
}

#[test]
fn resolver_durations_follow_the_clock() {
    let (mock, clock) = mock_clock();
    let schema = slow_schema(&mock).with_extension(TimingExtension::new().with_clock(clock));

    let response = schema.execute_sync("{ slow fast }");

    assert_eq!(response.data, Some(json!({ "slow": "done", "fast": "done" })));
    assert_eq!(
        *timing(&response),
        json!({
            "version": TIMING_VERSION,
            "duration": FIVE_MS,
            "parsing": { "startOffset": 0, "duration": 0 },
            "validation": { "startOffset": 0, "duration": 0 },
            "execution": {
                "resolvers": [
                    {
                        "path": ["slow"],
                        "parentType": "Query",
                        "fieldName": "slow",
                        "returnType": "String",
                        "startOffset": 0,
                        "duration": FIVE_MS,
                    },
                    {
                        "path": ["fast"],
                        "parentType": "Query",
                        "fieldName": "fast",
                        "returnType": "String",
                        "startOffset": FIVE_MS,
                        "duration": 0,
                    },
                ]
            }
        })
    );
}

#[test]
fn nested_fields_are_reported_with_their_paths() {
    let (_mock, clock) = mock_clock();
    let schema = user_schema().with_extension(TimingExtension::new().with_clock(clock));

    let response = schema.execute_sync("{ user { name friends { name } } }");
    assert!(response.is_ok());

    let resolvers = timing(&response)["execution"]["resolvers"]
        .as_array()
        .expect("resolver list")
        .clone();
    let mut paths: Vec<Value> = resolvers.iter().map(|r| r["path"].clone()).collect();
    let mut expected = vec![
        json!(["user"]),
        json!(["user", "name"]),
        json!(["user", "friends"]),
        json!(["user", "friends", 0, "name"]),
    ];
    paths.sort_by_key(ToString::to_string);
    expected.sort_by_key(ToString::to_string);
    assert_eq!(paths, expected);

    let name = resolvers
        .iter()
        .find(|r| r["path"] == json!(["user", "name"]))
        .expect("name resolver");
    assert_eq!(name["returnType"], "String!");
    assert_eq!(name["parentType"], "User");
}

#[test]
fn stage_timings_cover_parse_and_validation() {
    let clock = periscope_extensions::Clock::with_provider(Arc::new(SteppingClock::new(
        Duration::from_nanos(10),
    )));
    let schema = user_schema().with_extension(TimingExtension::new().with_clock(clock));

    let response = schema.execute_sync("{ user { name } }");
    let timing = timing(&response);

    // init reads t=0, parse start/finish read 10 and 20.
    assert_eq!(timing["parsing"], json!({ "startOffset": 10, "duration": 10 }));
    assert_eq!(timing["validation"], json!({ "startOffset": 30, "duration": 10 }));
}

#[test]
fn aborted_queries_report_no_timing() {
    let schema = user_schema().with_extension(TimingExtension::new());

    let response = schema.execute_sync("{ user");

    assert_eq!(response.data, None);
    assert_eq!(response.extensions, None);
}

#[test]
fn timing_sits_beside_other_results() {
    let (_mock, clock) = mock_clock();
    let schema = user_schema()
        .with_extension(TimingExtension::new().with_clock(clock))
        .with_extension(periscope_extensions::TracingExtension::new());

    let response = schema.execute_sync(Request::new("{ user { name } }"));

    let extensions = response.extensions.expect("extensions");
    assert_eq!(extensions.keys().collect::<Vec<_>>(), vec!["timing"]);
    assert_eq!(
        extensions["timing"]["execution"]["resolvers"][0]["path"],
        json!(["user"])
    );
}

#[tokio::test]
async fn concurrent_queries_keep_separate_traces() {
    let (mock, clock) = mock_clock();
    let schema = slow_schema(&mock).with_extension(TimingExtension::new().with_clock(clock));

    let (first, second) = tokio::join!(schema.execute("{ slow }"), schema.execute("{ fast }"));

    let first = timing(&first)["execution"]["resolvers"].clone();
    let second = timing(&second)["execution"]["resolvers"].clone();
    assert_eq!(first.as_array().map(Vec::len), Some(1));
    assert_eq!(second.as_array().map(Vec::len), Some(1));
    assert_eq!(first[0]["fieldName"], "slow");
    assert_eq!(second[0]["fieldName"], "fast");
}
