//! Time source shared by the timing and tracing extensions.
//!
//! Extensions read time through a [`Clock`] so that tests can substitute a
//! `MockClock` and get exact, repeatable durations.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use periscope_extensions::clock::{Clock, ClockProvider};
//!
//! /// A clock that always returns a fixed instant.
//! struct FixedClock(Instant);
//!
//! impl ClockProvider for FixedClock {
//!     fn now(&self) -> Instant {
//!         self.0
//!     }
//! }
//!
//! let clock = Clock::with_provider(std::sync::Arc::new(FixedClock(Instant::now())));
//! assert_eq!(clock.elapsed_since(clock.now()).as_nanos(), 0);
//! ```

use core::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ─────────────────────────────────────────────────────────────────────────────
// ClockProvider
// ─────────────────────────────────────────────────────────────────────────────

/// Source of the current instant.
pub trait ClockProvider: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Reads `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
struct SystemClock;

impl ClockProvider for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

/// Cheap-to-clone handle to a [`ClockProvider`].
#[derive(Clone)]
pub struct Clock {
    provider: Arc<dyn ClockProvider>,
}

impl Clock {
    /// A clock backed by the system monotonic clock.
    #[must_use]
    pub fn system() -> Self {
        Self {
            provider: Arc::new(SystemClock),
        }
    }

    /// A clock backed by a custom provider.
    #[must_use]
    pub fn with_provider(provider: Arc<dyn ClockProvider>) -> Self {
        Self { provider }
    }

    /// Returns the current instant.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.provider.now()
    }

    /// Returns the time elapsed since `earlier`, or zero if `earlier` is in
    /// the future.
    #[must_use]
    pub fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock").finish_non_exhaustive()
    }
}

/// Converts a duration to whole nanoseconds, saturating at `u64::MAX`.
#[must_use]
pub fn as_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

// ─────────────────────────────────────────────────────────────────────────────
// MockClock
// ─────────────────────────────────────────────────────────────────────────────

/// Manually advanced clock for tests.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
/// use periscope_extensions::clock::{Clock, MockClock};
///
/// let mock = Arc::new(MockClock::new(Instant::now()));
/// let clock = Clock::with_provider(mock.clone());
/// let start = clock.now();
///
/// mock.advance(Duration::from_millis(5));
/// assert_eq!(clock.elapsed_since(start), Duration::from_millis(5));
/// ```
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct MockClock {
    current: parking_lot::RwLock<Instant>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockClock {
    /// Creates a mock clock set to the given instant.
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            current: parking_lot::RwLock::new(start),
        }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.current.write() += duration;
    }

    /// Sets the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.current.write() = instant;
    }

    /// Returns the current instant.
    #[must_use]
    pub fn current(&self) -> Instant {
        *self.current.read()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ClockProvider for MockClock {
    fn now(&self) -> Instant {
        self.current()
    }
}
