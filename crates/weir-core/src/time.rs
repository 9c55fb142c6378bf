//! Time primitives
//!
//! Event time and arrival time are both carried as f64 milliseconds since
//! the Unix epoch, matching the wire representation.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Inclusive event-time window for history queries
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        TimeWindow { start, end }
    }

    /// Is the timestamp inside the window (both bounds inclusive)?
    #[inline]
    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds_inclusive() {
        let w = TimeWindow::new(1.0, 5.0);
        assert!(w.contains(1.0));
        assert!(w.contains(5.0));
        assert!(w.contains(3.0));
        assert!(!w.contains(0.999));
        assert!(!w.contains(5.001));
    }

    #[test]
    fn test_now_millis_advances() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
        assert!(a > 0.0);
    }
}
