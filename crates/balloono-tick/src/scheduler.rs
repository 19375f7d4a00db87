//! The scheduler itself.

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

use crate::{BudgetLevel, TickConfig, TickMetrics, TickPolicy};

/// What [`TickScheduler::wait_for_tick`] hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// 1 for the first tick, then counting up.
    pub tick: u64,
    /// Time since the previous tick (or since creation),
    /// capped at `max_step`. This is what the rooms advance by.
    pub elapsed: Duration,
    pub period: Duration,
    /// Fired more than a tenth of a period after its deadline.
    pub late: bool,
    /// Whole periods that passed without a tick.
    pub missed_periods: u64,
    /// `elapsed` was cut to `max_step`.
    pub clamped: bool,
}

/// Paces the driver loop and measures the time between ticks.
///
/// Deadlines run on the Tokio clock, so paused-time tests see exact
/// values. Work time (between a tick firing and [`finish_tick`]) is
/// measured on the real clock.
///
/// [`finish_tick`]: Self::finish_tick
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    period: Option<Duration>,
    ticks: u64,
    deadline: Option<TokioInstant>,
    last_fired: TokioInstant,
    work_started: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Validates `config` and schedules the first tick one period ahead.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let period = config.period();
        let now = TokioInstant::now();

        match period {
            Some(period) => debug!(
                rate_hz = config.tick_rate_hz,
                period_ms = period.as_secs_f64() * 1000.0,
                max_step_ms = config.max_step.as_secs_f64() * 1000.0,
                policy = ?config.policy,
                "tick scheduler ready"
            ),
            None => debug!("tick scheduler in manual mode"),
        }

        Self {
            deadline: period.map(|p| now + p),
            period,
            config,
            ticks: 0,
            last_fired: now,
            work_started: None,
            metrics: TickMetrics::default(),
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Sleeps until the next deadline and reports the tick.
    ///
    /// Pends forever in manual mode, so it is safe to
    /// use as one branch of a `tokio::select!`.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (deadline, period) = match (self.deadline, self.period) {
            (Some(deadline), Some(period)) => (deadline, period),
            _ => return std::future::pending().await,
        };

        time::sleep_until(deadline).await;
        let fired = TokioInstant::now();
        self.ticks += 1;
        self.work_started = Some(Instant::now());

        let behind = fired.saturating_duration_since(deadline);
        let late = behind > period / 10;
        let missed_periods = if late {
            u64::try_from(behind.as_nanos() / period.as_nanos()).unwrap_or(u64::MAX)
        } else {
            0
        };
        if late {
            warn!(
                tick = self.ticks,
                behind_ms = behind.as_secs_f64() * 1000.0,
                missed_periods,
                policy = ?self.config.policy,
                "driver woke up late"
            );
        }

        self.deadline = Some(match self.config.policy {
            TickPolicy::Realign => fired + period,
            TickPolicy::KeepGrid => deadline + period,
        });

        let measured = fired.saturating_duration_since(self.last_fired);
        self.last_fired = fired;
        let clamped = measured > self.config.max_step;
        let elapsed = measured.min(self.config.max_step);
        if clamped {
            warn!(
                tick = self.ticks,
                measured_ms = measured.as_secs_f64() * 1000.0,
                max_step_ms = self.config.max_step.as_secs_f64() * 1000.0,
                "elapsed time capped"
            );
        }

        self.metrics.record_fire(late, missed_periods, clamped);
        trace!(tick = self.ticks, elapsed_us = elapsed.as_micros() as u64, "tick");

        TickInfo {
            tick: self.ticks,
            elapsed,
            period,
            late,
            missed_periods,
            clamped,
        }
    }

    /// Marks the end of the current tick's work and checks it against
    /// the period. Does nothing unless a tick is in progress.
    pub fn finish_tick(&mut self) -> Option<BudgetLevel> {
        let started = self.work_started.take()?;
        let period = self.period?;
        let work = started.elapsed();

        self.metrics.record_work(work, period, self.config.track_timing);
        let level = BudgetLevel::classify(
            self.metrics.utilization,
            self.config.budget_warn,
            self.config.budget_critical,
        );
        match level {
            BudgetLevel::Within => {}
            BudgetLevel::Warn => warn!(
                tick = self.ticks,
                work_ms = work.as_secs_f64() * 1000.0,
                period_ms = period.as_secs_f64() * 1000.0,
                "tick work close to its period"
            ),
            BudgetLevel::Critical => warn!(
                tick = self.ticks,
                work_ms = work.as_secs_f64() * 1000.0,
                period_ms = period.as_secs_f64() * 1000.0,
                "tick work exceeded its period"
            ),
        }
        Some(level)
    }

    pub fn is_manual(&self) -> bool {
        self.period.is_none()
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn max_step(&self) -> Duration {
        self.config.max_step
    }
}
