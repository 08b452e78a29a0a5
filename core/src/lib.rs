//! # Paybridge Core
//!
//! Environment traits shared by every Paybridge crate.
//!
//! All time-dependent decisions in the workspace (token expiry buffers,
//! refresh attempt windows, cache sweeps) read the current time through
//! [`environment::Clock`] so that tests can substitute a controllable clock.
//!
//! ## Example
//!
//! ```
//! use paybridge_core::environment::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let now = clock.now();
//! assert!(now.timestamp_millis() > 0);
//! ```

/// Environment traits for dependency injection
///
/// All external dependencies are abstracted behind traits and injected
/// where they are needed.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Production - uses system clock
    /// let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    ///
    /// // Test - fixed time for deterministic tests
    /// let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(time));
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;

        /// Current time as milliseconds since the Unix epoch.
        fn now_millis(&self) -> i64 {
            self.now().timestamp_millis()
        }
    }

    /// Wall-clock time from the operating system.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_millis_match_datetime() {
        let clock = SystemClock;
        let before = chrono::Utc::now().timestamp_millis();
        let now = clock.now_millis();
        let after = chrono::Utc::now().timestamp_millis();
        assert!(before <= now && now <= after);
    }
}
