//! Counters and timing kept by the scheduler.

use std::time::Duration;

/// Weight of the newest sample in the work-time average.
const SMOOTHING: f64 = 0.1;

/// How much of its period a tick's work used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetLevel {
    Within,
    Warn,
    Critical,
}

impl BudgetLevel {
    /// Classifies a utilization (work time / period).
    pub fn classify(utilization: f64, warn: f64, critical: f64) -> Self {
        if utilization >= critical {
            Self::Critical
        } else if utilization >= warn {
            Self::Warn
        } else {
            Self::Within
        }
    }
}

/// Running totals since the scheduler was created.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub ticks: u64,
    /// Ticks that fired more than a tenth of a period late.
    pub late_ticks: u64,
    /// Whole periods lost to late wake-ups.
    pub missed_periods: u64,
    /// Ticks whose `elapsed` was cut to `max_step`.
    pub clamped_ticks: u64,
    /// Smoothed work time per tick.
    pub avg_work: Duration,
    pub max_work: Duration,
    /// Work time over period for the latest finished tick.
    pub utilization: f64,
}

impl TickMetrics {
    pub(crate) fn record_fire(&mut self, late: bool, missed: u64, clamped: bool) {
        self.ticks += 1;
        self.late_ticks += u64::from(late);
        self.missed_periods += missed;
        self.clamped_ticks += u64::from(clamped);
    }

    pub(crate) fn record_work(&mut self, work: Duration, period: Duration, track_timing: bool) {
        self.utilization = work.as_secs_f64() / period.as_secs_f64();
        if !track_timing {
            return;
        }
        self.max_work = self.max_work.max(work);
        let avg = self.avg_work.as_secs_f64() * (1.0 - SMOOTHING) + work.as_secs_f64() * SMOOTHING;
        self.avg_work = Duration::from_secs_f64(avg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(BudgetLevel::classify(0.5, 0.8, 1.0), BudgetLevel::Within);
        assert_eq!(BudgetLevel::classify(0.8, 0.8, 1.0), BudgetLevel::Warn);
        assert_eq!(BudgetLevel::classify(1.3, 0.8, 1.0), BudgetLevel::Critical);
    }

    #[test]
    fn test_record_work_smooths_and_tracks_max() {
        let mut metrics = TickMetrics::default();
        let period = Duration::from_millis(50);

        metrics.record_work(Duration::from_millis(10), period, true);
        assert_eq!(metrics.max_work, Duration::from_millis(10));
        assert!((metrics.avg_work.as_secs_f64() - 0.001).abs() < 1e-9);
        assert!((metrics.utilization - 0.2).abs() < 1e-9);

        metrics.record_work(Duration::from_millis(5), period, true);
        assert_eq!(metrics.max_work, Duration::from_millis(10));
    }

    #[test]
    fn test_untracked_timing_only_sets_utilization() {
        let mut metrics = TickMetrics::default();
        metrics.record_work(Duration::from_millis(25), Duration::from_millis(50), false);

        assert_eq!(metrics.avg_work, Duration::ZERO);
        assert_eq!(metrics.max_work, Duration::ZERO);
        assert!((metrics.utilization - 0.5).abs() < 1e-9);
    }
}
