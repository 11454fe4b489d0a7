// src/notify/throttle.rs
use chrono::NaiveDate;

/// Once-per-calendar-day gate for notification runs.
/// - First run always allowed.
/// - A second run on the same date is suppressed.
/// - State is updated explicitly via `record` after a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyThrottle {
    last_run: Option<NaiveDate>,
}

impl DailyThrottle {
    pub fn new(last_run: Option<NaiveDate>) -> Self {
        Self { last_run }
    }

    /// Check if a run may happen on `today`. Does NOT mutate state.
    pub fn should_generate(&self, today: NaiveDate) -> bool {
        self.last_run != Some(today)
    }

    pub fn record(&mut self, today: NaiveDate) {
        self.last_run = Some(today);
    }

    pub fn last_run(&self) -> Option<NaiveDate> {
        self.last_run
    }
}
