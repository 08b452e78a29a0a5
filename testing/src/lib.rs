//! # Paybridge Testing
//!
//! Testing utilities and helpers for the Paybridge crates.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A controllable clock for window and expiry tests
//! - Tracing setup for test output
//!
//! ## Example
//!
//! ```
//! use paybridge_testing::{ManualClock, test_clock};
//! use paybridge_core::environment::Clock;
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(test_clock().now());
//! let start = clock.now();
//! clock.advance(Duration::minutes(5));
//! assert_eq!(clock.now() - start, Duration::minutes(5));
//! ```

use chrono::{DateTime, Utc};
use paybridge_core::environment::Clock;

/// Mock implementations of Environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use paybridge_testing::mocks::FixedClock;
    /// use paybridge_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when a test advances it.
    ///
    /// Clones share the same underlying time, so a test can hand one clone to
    /// the component under test and keep another to drive it.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        millis: Arc<AtomicI64>,
    }

    impl ManualClock {
        /// Create a manual clock starting at `start`.
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
            }
        }

        /// Move the clock forward (or backward, for negative durations).
        pub fn advance(&self, by: chrono::Duration) {
            self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
        }

        /// Jump to an absolute time.
        pub fn set(&self, time: DateTime<Utc>) {
            self.millis.store(time.timestamp_millis(), Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
                .unwrap_or(DateTime::UNIX_EPOCH)
        }

        fn now_millis(&self) -> i64 {
            self.millis.load(Ordering::SeqCst)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Install a test-friendly tracing subscriber.
    ///
    /// Output goes through the test writer so it is captured per test.
    /// Repeated calls are harmless.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    /// Collects formatted log output in memory so tests can assert on it.
    ///
    /// The subscriber installed by [`install`](Self::install) is thread-local,
    /// so use it from a current-thread runtime.
    #[derive(Debug, Clone, Default)]
    pub struct LogCapture {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl LogCapture {
        /// Create an empty capture.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Route `DEBUG` and above on this thread into the capture until the
        /// returned guard is dropped.
        #[must_use = "logs are only captured while the guard is alive"]
        pub fn install(&self) -> tracing::subscriber::DefaultGuard {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        /// Everything captured so far.
        #[must_use]
        pub fn contents(&self) -> String {
            self.buffer
                .lock()
                .map(|buffer| String::from_utf8_lossy(&buffer).into_owned())
                .unwrap_or_default()
        }

        /// Whether any captured output contains `needle`.
        #[must_use]
        pub fn contains(&self, needle: &str) -> bool {
            self.contents().contains(needle)
        }
    }

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Ok(mut buffer) = self.buffer.lock() {
                buffer.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

// Re-export commonly used items
pub use helpers::{LogCapture, init_test_tracing};
pub use mocks::{FixedClock, ManualClock, test_clock};
