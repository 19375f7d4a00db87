//! Driver clock tests.
//!
//! All async tests run on a paused Tokio clock: sleeps complete as soon
//! as the runtime is idle, and `tokio::time::advance` stands in for a
//! stalled process.

use std::time::Duration;

use balloono_tick::{BudgetLevel, TickConfig, TickPolicy, TickScheduler};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn twenty_hz() -> TickScheduler {
    TickScheduler::with_rate(20)
}

#[test]
fn test_new_scheduler_has_not_ticked() {
    let s = twenty_hz();
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.tick_rate_hz(), 20);
    assert_eq!(s.period(), Some(ms(50)));
    assert_eq!(s.max_step(), ms(250));
    assert!(!s.is_manual());
    assert_eq!(s.metrics().ticks, 0);
}

#[test]
fn test_rate_is_validated_on_creation() {
    let s = TickScheduler::new(TickConfig::with_rate(500));
    assert_eq!(s.tick_rate_hz(), TickConfig::MAX_TICK_RATE_HZ);
}

// =========================================================================
// Measured elapsed time
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_on_time_ticks_report_one_period() {
    let mut s = twenty_hz();

    for n in 1..=4 {
        let tick = s.wait_for_tick().await;
        assert_eq!(tick.tick, n);
        assert_eq!(tick.elapsed, ms(50));
        assert!(!tick.late);
        assert!(!tick.clamped);
    }
    assert_eq!(s.tick_count(), 4);
    assert_eq!(s.metrics().ticks, 4);
}

#[tokio::test(start_paused = true)]
async fn test_late_wake_up_reports_the_real_gap() {
    let mut s = twenty_hz();
    s.wait_for_tick().await;

    // The next deadline is 50ms away; the process stalls for 130ms.
    tokio::time::advance(ms(130)).await;
    let tick = s.wait_for_tick().await;

    assert_eq!(tick.elapsed, ms(130));
    assert!(tick.late);
    assert_eq!(tick.missed_periods, 1);
    assert!(!tick.clamped);
    assert_eq!(s.metrics().late_ticks, 1);
    assert_eq!(s.metrics().missed_periods, 1);
}

#[tokio::test(start_paused = true)]
async fn test_long_stall_is_capped() {
    let mut s = twenty_hz();
    s.wait_for_tick().await;

    tokio::time::advance(Duration::from_secs(4)).await;
    let tick = s.wait_for_tick().await;

    assert!(tick.clamped);
    assert_eq!(tick.elapsed, ms(250));
    assert_eq!(s.metrics().clamped_ticks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_realign_waits_a_full_period_after_a_late_tick() {
    let mut s = twenty_hz();
    s.wait_for_tick().await;
    tokio::time::advance(ms(80)).await;
    s.wait_for_tick().await;

    let tick = s.wait_for_tick().await;
    assert_eq!(tick.elapsed, ms(50));
}

#[tokio::test(start_paused = true)]
async fn test_keep_grid_catches_up_to_the_original_deadlines() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::KeepGrid,
        ..TickConfig::with_rate(20)
    });
    s.wait_for_tick().await; // 50ms
    tokio::time::advance(ms(80)).await; // 130ms, deadline was 100ms
    assert!(s.wait_for_tick().await.late);

    // Back on the grid: the next deadline is 150ms.
    let tick = s.wait_for_tick().await;
    assert_eq!(tick.elapsed, ms(20));
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_sums_to_wall_time() {
    let mut s = twenty_hz();
    let start = tokio::time::Instant::now();
    let mut simulated = Duration::ZERO;

    for i in 0..10 {
        if i == 4 {
            tokio::time::advance(ms(70)).await;
        }
        simulated += s.wait_for_tick().await.elapsed;
    }

    assert_eq!(simulated, start.elapsed());
}

// =========================================================================
// Manual mode
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_manual_mode_never_ticks() {
    let mut s = TickScheduler::with_rate(0);
    assert!(s.is_manual());
    assert_eq!(s.period(), None);

    let waited = tokio::time::timeout(Duration::from_secs(10), s.wait_for_tick()).await;
    assert!(waited.is_err());
}

// =========================================================================
// Work budget
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_finish_tick_outside_a_tick_does_nothing() {
    let mut s = twenty_hz();
    assert_eq!(s.finish_tick(), None);

    s.wait_for_tick().await;
    assert!(s.finish_tick().is_some());
    assert_eq!(s.finish_tick(), None);
}

#[tokio::test(start_paused = true)]
async fn test_short_work_is_within_budget() {
    let mut s = twenty_hz();
    s.wait_for_tick().await;
    // Work time is measured on the real clock.
    std::thread::sleep(Duration::from_micros(100));

    assert_eq!(s.finish_tick(), Some(BudgetLevel::Within));
    let metrics = s.metrics();
    assert!(metrics.utilization > 0.0 && metrics.utilization < 0.8);
    assert!(metrics.max_work >= Duration::from_micros(100));
}

#[tokio::test(start_paused = true)]
async fn test_slow_work_is_critical() {
    let mut s = TickScheduler::new(TickConfig::with_rate(100));
    s.wait_for_tick().await;
    std::thread::sleep(ms(15));

    assert_eq!(s.finish_tick(), Some(BudgetLevel::Critical));
    assert!(s.metrics().utilization >= 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_untracked_timing_keeps_work_stats_at_zero() {
    let mut s = TickScheduler::new(TickConfig {
        track_timing: false,
        ..TickConfig::with_rate(20)
    });
    s.wait_for_tick().await;
    s.finish_tick();

    assert_eq!(s.metrics().avg_work, Duration::ZERO);
    assert_eq!(s.metrics().max_work, Duration::ZERO);
}

// =========================================================================
// Driver loop shape
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_stops_on_shutdown() {
    let mut s = twenty_hz();
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        tokio::time::sleep(ms(175)).await;
        let _ = stop_tx.send(());
    });

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            tick = s.wait_for_tick() => {
                ticks += 1;
                assert_eq!(tick.tick, ticks);
                s.finish_tick();
            }
        }
    }

    assert_eq!(ticks, 3);
}
