//! Driver settings.

use std::time::Duration;

use tracing::warn;

/// How the next deadline is chosen after the driver woke up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Schedule the next tick one period after the late wake-up. The time
    /// lost is still reported, folded into that tick's `elapsed`.
    #[default]
    Realign,
    /// Stay on the original grid of deadlines, so the tick after a late
    /// one may fire almost immediately.
    KeepGrid,
}

/// Settings for a [`TickScheduler`](crate::TickScheduler).
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. 0 means manual mode.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Largest `elapsed` a single tick may report. After a long stall the
    /// rooms resume with at most this much simulated time.
    pub max_step: Duration,
    /// Fraction of the period the tick's work may use before a warning.
    pub budget_warn: f64,
    /// Fraction of the period at which the warning becomes critical.
    pub budget_critical: f64,
    /// Keep average and worst-case work time in [`TickMetrics`](crate::TickMetrics).
    pub track_timing: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            policy: TickPolicy::default(),
            max_step: Duration::from_millis(250),
            budget_warn: 0.8,
            budget_critical: 1.0,
            track_timing: true,
        }
    }
}

impl TickConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// Defaults at `tick_rate_hz`.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Self::default()
        }
    }

    /// Brings every field into range:
    ///
    /// - the rate is capped at [`Self::MAX_TICK_RATE_HZ`];
    /// - `max_step` is never shorter than one period;
    /// - budget fractions lie in `0.0..=1.0` with warn ≤ critical.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                requested = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick rate too high, capping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        if let Some(period) = self.period() {
            self.max_step = self.max_step.max(period);
        }
        self.budget_critical = sanitize_fraction(self.budget_critical, 1.0);
        self.budget_warn = sanitize_fraction(self.budget_warn, 0.8).min(self.budget_critical);
        self
    }

    /// One tick period, or `None` in manual mode.
    pub fn period(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0).then(|| Duration::from_secs(1) / self.tick_rate_hz)
    }
}

fn sanitize_fraction(value: f64, fallback: f64) -> f64 {
    if value.is_nan() { fallback } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TickConfig::default();
        assert_eq!(config.tick_rate_hz, 20);
        assert_eq!(config.period(), Some(Duration::from_millis(50)));
        assert_eq!(config.max_step, Duration::from_millis(250));
        assert_eq!(config.policy, TickPolicy::Realign);
    }

    #[test]
    fn test_zero_rate_has_no_period() {
        assert_eq!(TickConfig::with_rate(0).period(), None);
    }

    #[test]
    fn test_validated_fixes_out_of_range_fields() {
        let config = TickConfig {
            tick_rate_hz: 1_000,
            budget_warn: 2.0,
            budget_critical: f64::NAN,
            ..TickConfig::default()
        }
        .validated();

        assert_eq!(config.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
        assert_eq!(config.budget_critical, 1.0);
        assert_eq!(config.budget_warn, 1.0);
    }

    #[test]
    fn test_warn_never_exceeds_critical() {
        let config = TickConfig {
            budget_warn: 0.9,
            budget_critical: 0.5,
            ..TickConfig::default()
        }
        .validated();
        assert_eq!(config.budget_warn, 0.5);
    }

    #[test]
    fn test_max_step_covers_one_period() {
        let config = TickConfig {
            tick_rate_hz: 2,
            max_step: Duration::from_millis(10),
            ..TickConfig::default()
        }
        .validated();

        assert_eq!(config.max_step, Duration::from_millis(500));
    }
}
