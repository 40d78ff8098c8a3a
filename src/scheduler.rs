//! Cancellable session timers.
//!
//! Each session owns its timers; canceling one is idempotent and a fired
//! callback must re-check the session is still in the expected state
//! before mutating it, since a cancel may race the fire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

pub const PVP_REQUEST_SWEEP_INTERVAL_SECS: u64 = 15;
pub const CLAN_INVITE_SWEEP_INTERVAL_SECS: u64 = 60;
pub const CLAN_BATTLE_COUNTDOWN_SECS: u64 = 20;
pub const RAID_LOBBY_SECS: u64 = 130;
pub const RAID_STAGE_TRANSITION_SECS_MILLIS: u64 = 3_500;
pub const RAID_BATTLE_TICK_SECS_MILLIS: u64 = 2_500;
pub const ASSAULT_EXPEDITION_WINDOW_SECS: u64 = 5 * 60;
pub const ASSAULT_EXPEDITION_CADENCE_SECS: u64 = 35 * 60;
pub const AUTOSAVE_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 5 * 60;

/// A single cancellable one-shot or periodic timer. Dropping the handle
/// does not cancel the task; call `cancel` explicitly.
pub struct Timer {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Timer {
    /// Fire `callback` once after `delay`. The callback only runs if the
    /// timer has not been cancelled by the time the delay elapses.
    pub fn one_shot<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                callback();
            }
        });
        Self { cancelled, handle }
    }

    /// Fire `callback` every `period` until cancelled.
    pub fn periodic<F>(period: Duration, mut callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                callback();
            }
        });
        Self { cancelled, handle }
    }

    /// Idempotent: cancelling twice is a no-op.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn abort(&self) {
        self.cancel();
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let _timer = Timer::one_shot(Duration::from_millis(10), move || {
            flag.store(true, Ordering::SeqCst);
        });
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_before_fire_suppresses_callback() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let timer = Timer::one_shot(Duration::from_millis(10), move || {
            flag.store(true, Ordering::SeqCst);
        });
        timer.cancel();
        timer.cancel(); // idempotent
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_fires_multiple_times_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let timer = Timer::periodic(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::advance(Duration::from_millis(35)).await;
        tokio::task::yield_now().await;
        timer.abort();
        assert!(count.load(Ordering::SeqCst) >= 3);
    }
}
