//! Lease (TTL) timers driving [`super::machine::ServiceAvailabilityMachine`].
//!
//! A timer never invokes its expiration callback while holding its own lock,
//! so callbacks are free to call back into the timer.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub type ExpirationCallback = Arc<dyn Fn() + Send + Sync>;

/// Single-shot, resettable, cancellable countdown.
pub trait LeaseTimer: Send + Sync {
    /// Restart the countdown at `ttl`, discarding any pending one.
    fn reset(&self, ttl: Duration);

    /// Stop the countdown without firing.
    fn cancel(&self);

    fn set_expiration_callback(&self, callback: ExpirationCallback);

    fn clear_expiration_callback(&self);

    fn is_running(&self) -> bool;
}

#[derive(Default)]
struct ManualState {
    running: bool,
    duration: Option<Duration>,
    callback: Option<ExpirationCallback>,
}

/// Timer driven by the caller: nothing happens until [`ManualLeaseTimer::expire`].
#[derive(Default)]
pub struct ManualLeaseTimer {
    state: Mutex<ManualState>,
}

impl ManualLeaseTimer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Duration of the last `reset`.
    pub fn duration(&self) -> Option<Duration> {
        self.lock().duration
    }

    pub fn has_callback(&self) -> bool {
        self.lock().callback.is_some()
    }

    /// Simulate natural expiry. Returns `true` if a callback ran.
    pub fn expire(&self) -> bool {
        let callback = {
            let mut state = self.lock();
            if !state.running {
                return false;
            }
            state.running = false;
            state.callback.clone()
        };

        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// The registered callback, for simulating a late delivery.
    pub fn callback_snapshot(&self) -> Option<ExpirationCallback> {
        self.lock().callback.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LeaseTimer for ManualLeaseTimer {
    fn reset(&self, ttl: Duration) {
        let mut state = self.lock();
        state.running = true;
        state.duration = Some(ttl);
    }

    fn cancel(&self) {
        self.lock().running = false;
    }

    fn set_expiration_callback(&self, callback: ExpirationCallback) {
        self.lock().callback = Some(callback);
    }

    fn clear_expiration_callback(&self) {
        self.lock().callback = None;
    }

    fn is_running(&self) -> bool {
        self.lock().running
    }
}

#[derive(Default)]
struct TokioState {
    // Bumped on every reset/cancel; a countdown only fires if it still owns the generation.
    generation: u64,
    task: Option<JoinHandle<()>>,
    callback: Option<ExpirationCallback>,
}

/// Lease timer backed by a tokio task per countdown.
pub struct TokioLeaseTimer {
    handle: Handle,
    state: Arc<Mutex<TokioState>>,
}

impl TokioLeaseTimer {
    pub fn new(handle: Handle) -> Arc<Self> {
        Arc::new(TokioLeaseTimer {
            handle,
            state: Arc::new(Mutex::new(TokioState::default())),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TokioState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stop(state: &mut TokioState) {
        state.generation = state.generation.wrapping_add(1);
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }
}

impl LeaseTimer for TokioLeaseTimer {
    fn reset(&self, ttl: Duration) {
        let mut state = self.lock();
        Self::stop(&mut state);

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        state.task = Some(self.handle.spawn(async move {
            tokio::time::sleep(ttl).await;

            let callback = {
                let mut state = shared.lock().unwrap_or_else(|e| e.into_inner());
                if state.generation != generation {
                    return;
                }
                state.task = None;
                state.callback.clone()
            };
            if let Some(callback) = callback {
                callback();
            }
        }));
    }

    fn cancel(&self) {
        Self::stop(&mut self.lock());
    }

    fn set_expiration_callback(&self, callback: ExpirationCallback) {
        self.lock().callback = Some(callback);
    }

    fn clear_expiration_callback(&self) {
        self.lock().callback = None;
    }

    fn is_running(&self) -> bool {
        self.lock().task.is_some()
    }
}

impl Drop for TokioLeaseTimer {
    fn drop(&mut self) {
        Self::stop(&mut self.lock());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback(counter: &Arc<AtomicUsize>) -> ExpirationCallback {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_manual_timer_expiry() {
        let timer = ManualLeaseTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        timer.set_expiration_callback(counting_callback(&fired));

        assert!(!timer.expire());
        timer.reset(Duration::from_secs(3));
        assert!(timer.is_running());
        assert_eq!(timer.duration(), Some(Duration::from_secs(3)));

        assert!(timer.expire());
        assert!(!timer.is_running());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_timer_cancel_suppresses_callback() {
        let timer = ManualLeaseTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        timer.set_expiration_callback(counting_callback(&fired));

        timer.reset(Duration::from_secs(1));
        timer.cancel();
        assert!(!timer.expire());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tokio_timer_fires_once() {
        let timer = TokioLeaseTimer::new(Handle::current());
        let fired = Arc::new(AtomicUsize::new(0));
        timer.set_expiration_callback(counting_callback(&fired));

        timer.reset(Duration::from_millis(20));
        assert!(timer.is_running());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_running());
    }

    #[tokio::test]
    async fn test_tokio_timer_reset_and_cancel() {
        let timer = TokioLeaseTimer::new(Handle::current());
        let fired = Arc::new(AtomicUsize::new(0));
        timer.set_expiration_callback(counting_callback(&fired));

        timer.reset(Duration::from_millis(20));
        timer.reset(Duration::from_millis(200));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        timer.cancel();
        assert!(!timer.is_running());
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
