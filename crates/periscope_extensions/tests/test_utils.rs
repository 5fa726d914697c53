//! Shared test utilities for `periscope_extensions` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not all items are used in every test binary"
)]

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use periscope_engine::Schema;
use periscope_extensions::{Clock, MockClock};
use periscope_query::schema::{Field, ObjectType, TypeRef, TypeSystem};
use serde_json::json;

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEMAS
// ═══════════════════════════════════════════════════════════════════════════════

/// `user: User` with `name: String!` and `friends: [User]`.
pub fn user_schema() -> Schema {
    let user = ObjectType::new("User")
        .field("name", Field::new(TypeRef::non_null("String")))
        .field("friends", Field::new(TypeRef::list("User")));
    let query = ObjectType::new("Query").field(
        "user",
        Field::new("User").resolve(|_| {
            Ok(json!({
                "name": "ada",
                "friends": [{ "name": "grace", "friends": [] }],
            }))
        }),
    );
    Schema::new(TypeSystem::build(query).register(user).finish().expect("valid schema"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCKS
// ═══════════════════════════════════════════════════════════════════════════════

/// A mock clock and a [`Clock`] reading it.
pub fn mock_clock() -> (Arc<MockClock>, Clock) {
    let mock = Arc::new(MockClock::new(Instant::now()));
    let clock = Clock::with_provider(mock.clone());
    (mock, clock)
}

/// A clock that advances by `step` every time it is read.
pub struct SteppingClock {
    current: Mutex<Instant>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            current: Mutex::new(Instant::now()),
            step,
        }
    }
}

impl periscope_extensions::ClockProvider for SteppingClock {
    fn now(&self) -> Instant {
        let mut current = self.current.lock();
        let now = *current;
        *current += self.step;
        now
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOG CAPTURE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory sink for `tracing_subscriber::fmt` output.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber writing TRACE-level output to
/// the returned capture.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
    let logs = CapturedLogs::new();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs)
}
