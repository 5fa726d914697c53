//! Events emitted by the tracing extension.

mod test_utils;

use periscope_engine::Request;
use periscope_extensions::TracingExtension;
use test_utils::*;

fn count(lines: &[String], needle: &str) -> usize {
    lines.iter().filter(|line| line.contains(needle)).count()
}

#[test]
fn every_stage_boundary_is_logged() {
    let schema = user_schema().with_extension(TracingExtension::new());

    let (response, logs) = capture_logs(|| {
        schema.execute_sync(
            Request::new("query Profile { user { name } }").with_operation_name("Profile"),
        )
    });
    assert!(response.is_ok());
    assert!(response.extensions.is_none());

    let lines = logs.lines();
    for message in [
        "query started",
        "parse started",
        "parse finished",
        "validation started",
        "validation finished",
        "execution started",
        "execution finished",
    ] {
        assert_eq!(count(&lines, message), 1, "{message} in {lines:#?}");
    }
    assert_eq!(count(&lines, "field started"), 2);
    assert_eq!(count(&lines, "field finished"), 2);
    assert_eq!(count(&lines, "path=user.name"), 2);
    let started = lines.iter().find(|l| l.contains("query started")).unwrap();
    assert!(started.contains("operation=\"Profile\""));
}

#[test]
fn parse_errors_are_logged_with_their_message() {
    let schema = user_schema().with_extension(TracingExtension::new());

    let (response, logs) = capture_logs(|| schema.execute_sync("{ user"));
    assert_eq!(response.data, None);

    let lines = logs.lines();
    let finished: Vec<_> = lines.iter().filter(|l| l.contains("parse finished")).collect();
    assert_eq!(finished.len(), 1);
    assert!(finished[0].contains("Syntax Error"));
    assert_eq!(count(&lines, "validation started"), 0);
}

#[test]
fn recovered_faults_are_logged_as_warnings() {
    struct Broken;

    impl periscope_engine::Extension for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn has_result(&self) -> bool {
            true
        }

        fn get_result(&self, _ctx: &periscope_context::Context) -> serde_json::Value {
            panic!("no result today")
        }
    }

    let schema = user_schema()
        .with_extension(TracingExtension::new())
        .with_extension(Broken);

    let (response, logs) = capture_logs(|| schema.execute_sync("{ user { name } }"));
    assert_eq!(
        response.error_messages(),
        vec!["broken.GetResult: no result today"]
    );
    assert!(
        logs.lines()
            .iter()
            .any(|line| line.contains("WARN") && line.contains("no result today"))
    );
}
