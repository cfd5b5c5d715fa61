//! Cosmetic loading indicator, attached to the orchestrator as an observer.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Ceiling while a fetch is in flight
pub const IN_FLIGHT_CEILING: u8 = 90;

/// Hooks for the fetch lifecycle, tagged with the fetch's generation.
///
/// Both run while the orchestrator holds its state lock, so they must not
/// call back into the orchestrator. `on_finish` runs only for the fetch whose
/// result was committed; a superseded fetch never reports.
pub trait FetchObserver: Send + Sync {
    fn on_start(&self, generation: u64);
    fn on_finish(&self, generation: u64);
}

/// Observer that ignores everything
pub struct NoopObserver;

impl FetchObserver for NoopObserver {
    fn on_start(&self, _generation: u64) {}
    fn on_finish(&self, _generation: u64) {}
}

/// One tick: move 8% of the remaining distance toward 90, never past it.
pub fn advance(value: u8) -> u8 {
    if value >= IN_FLIGHT_CEILING {
        return IN_FLIGHT_CEILING;
    }
    let x = f64::from(value);
    let next = (x + (f64::from(IN_FLIGHT_CEILING) - x) * 0.08).round();
    (next as u8).min(IN_FLIGHT_CEILING)
}

/// Progress value in `0..=100` driven by a tokio ticker.
pub struct ProgressMeter {
    value: Arc<AtomicU8>,
    /// Generation of the fetch currently shown
    generation: AtomicU64,
    tick: Duration,
    reset_after: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
    reset: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressMeter {
    pub fn new(tick: Duration, reset_after: Duration) -> Self {
        Self {
            value: Arc::new(AtomicU8::new(0)),
            generation: AtomicU64::new(0),
            tick,
            reset_after,
            ticker: Mutex::new(None),
            reset: Mutex::new(None),
        }
    }

    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn is_ticking(&self) -> bool {
        lock(&self.ticker)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn stop_ticker(&self) {
        if let Some(handle) = lock(&self.ticker).take() {
            handle.abort();
        }
    }

    fn cancel_reset(&self) {
        if let Some(handle) = lock(&self.reset).take() {
            handle.abort();
        }
    }

    fn spawn(&self, fut: impl std::future::Future<Output = ()> + Send + 'static) -> Option<JoinHandle<()>> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(fut)),
            Err(_) => {
                debug!("no tokio runtime, progress meter stays static");
                None
            }
        }
    }
}

impl FetchObserver for ProgressMeter {
    fn on_start(&self, generation: u64) {
        self.generation.store(generation, Ordering::SeqCst);
        self.stop_ticker();
        self.cancel_reset();
        self.value.store(0, Ordering::Relaxed);

        let value = Arc::clone(&self.value);
        let tick = self.tick;
        let handle = self.spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let _ = value.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| Some(advance(x)));
            }
        });
        *lock(&self.ticker) = handle;
    }

    fn on_finish(&self, generation: u64) {
        let current = self.generation.load(Ordering::SeqCst);
        if generation != current {
            debug!(generation, current, "ignoring finish of an older fetch");
            return;
        }
        self.stop_ticker();
        self.cancel_reset();
        self.value.store(100, Ordering::Relaxed);

        let value = Arc::clone(&self.value);
        let reset_after = self.reset_after;
        let handle = self.spawn(async move {
            tokio::time::sleep(reset_after).await;
            value.store(0, Ordering::Relaxed);
        });
        *lock(&self.reset) = handle;
    }
}

impl Drop for ProgressMeter {
    fn drop(&mut self) {
        self.stop_ticker();
        self.cancel_reset();
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_asymptotic_to_ninety() {
        assert_eq!(advance(0), 7);
        assert_eq!(advance(89), 89);
        assert_eq!(advance(90), 90);
        assert_eq!(advance(100), 90);

        let mut x = 0;
        for _ in 0..1000 {
            let next = advance(x);
            assert!(next >= x);
            assert!(next <= IN_FLIGHT_CEILING);
            x = next;
        }
        assert!(x < 100);
    }

    #[tokio::test]
    async fn meter_ticks_then_completes_and_resets() {
        let meter = ProgressMeter::new(Duration::from_millis(5), Duration::from_millis(30));

        meter.on_start(1);
        assert_eq!(meter.value(), 0);
        assert!(meter.is_ticking());

        tokio::time::sleep(Duration::from_millis(80)).await;
        let mid = meter.value();
        assert!(mid > 0 && mid <= IN_FLIGHT_CEILING, "mid = {}", mid);

        meter.on_finish(1);
        assert_eq!(meter.value(), 100);
        assert!(!meter.is_ticking());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(meter.value(), 0);
    }

    #[tokio::test]
    async fn finish_of_older_fetch_keeps_newer_one_ticking() {
        let meter = ProgressMeter::new(Duration::from_millis(5), Duration::from_millis(30));

        meter.on_start(1);
        meter.on_start(2);
        meter.on_finish(1);
        assert!(meter.is_ticking());
        assert!(meter.value() < 100);

        meter.on_finish(2);
        assert!(!meter.is_ticking());
        assert_eq!(meter.value(), 100);
    }
}
