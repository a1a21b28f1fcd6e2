use crate::models::LogEvent;

/// Drops events older than the session's start time. Reading "from head"
/// can hand back records at or slightly before the requested bound, so this
/// is the one place the lower bound is enforced exactly.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    start_time: i64,
}

impl EventFilter {
    pub fn new(start_time: i64) -> Self {
        Self { start_time }
    }

    pub fn keep(&self, event: &LogEvent) -> bool {
        event.timestamp >= self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_events_at_or_after_start() {
        let filter = EventFilter::new(60);
        assert!(filter.keep(&LogEvent::new(60, "edge")));
        assert!(filter.keep(&LogEvent::new(100, "later")));
        assert!(!filter.keep(&LogEvent::new(59, "early")));
    }

    #[test]
    fn negative_bounds_are_compared_numerically() {
        let filter = EventFilter::new(-10);
        assert!(filter.keep(&LogEvent::new(0, "x")));
        assert!(!filter.keep(&LogEvent::new(-11, "y")));
    }
}
