//! Room server time.

use std::time::Duration;

/// Monotonic server time of one room.
///
/// Starts at zero when the room is created and only moves forward, by
/// the elapsed time of each tick. Every timestamp in the simulation
/// (`slow_until`, fuse expiry, banana cooldown, ...) is an absolute
/// value on this clock, so state is a pure function of the clock and
/// nothing counts down in the background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerClock {
    now: Duration,
}

impl ServerClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current server time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Moves time forward. Saturates instead of wrapping.
    pub fn advance(&mut self, elapsed: Duration) -> Duration {
        self.now = self.now.saturating_add(elapsed);
        self.now
    }
}

/// Server time as `f64` seconds, the unit snapshots use.
pub fn secs(t: Duration) -> f64 {
    t.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let mut clock = ServerClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_millis(50));
        clock.advance(Duration::ZERO);
        assert_eq!(clock.now(), Duration::from_millis(50));

        clock.advance(Duration::MAX);
        assert_eq!(clock.now(), Duration::MAX);
    }
}
