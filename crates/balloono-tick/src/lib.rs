//! The driver clock for Balloono.
//!
//! A single [`TickScheduler`] paces the whole server. It wakes at a fixed
//! rate (1–128 Hz) and reports, with each tick, the wall-clock time that
//! actually passed since the previous one. Rooms are advanced by that
//! measured value rather than the nominal period: clients poll and push
//! at irregular intervals and the process can stall, and movement must
//! still cover the right distance.
//!
//! A rate of 0 puts the scheduler in manual mode, where
//! [`TickScheduler::wait_for_tick`] never completes and the embedder
//! advances rooms itself.
//!
//! ```ignore
//! loop {
//!     let tick = scheduler.wait_for_tick().await;
//!     registry.tick_all(tick.elapsed).await;
//!     scheduler.finish_tick();
//! }
//! ```

mod config;
mod metrics;
mod scheduler;

pub use config::{TickConfig, TickPolicy};
pub use metrics::{BudgetLevel, TickMetrics};
pub use scheduler::{TickInfo, TickScheduler};
