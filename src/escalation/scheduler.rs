//! Owned, cancellable timer tasks.
//!
//! The engine holds at most one countdown and one pending reset. Each is a
//! [`ScheduledTask`]; replacing or dropping the handle cancels the task, so a
//! superseded timer can never outlive the phase that armed it.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Period of the countdown tick.
pub const TICK: Duration = Duration::from_secs(1);

/// Delay before `Resolved` resets to `Idle`.
pub const RESOLVED_GRACE: Duration = Duration::from_secs(3);

/// Handle to a spawned timer task. Cancels the task when dropped.
#[derive(Debug)]
pub struct ScheduledTask {
    cancel: CancellationToken,
}

impl ScheduledTask {
    /// Spawns a repeating task calling `on_tick` every `period`.
    ///
    /// The first tick fires one full period after the call. The task stops
    /// when `on_tick` returns [`ControlFlow::Break`] or the handle (or
    /// `parent`) is cancelled.
    pub fn repeating<F>(
        runtime: &Handle,
        parent: &CancellationToken,
        period: Duration,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let cancel = parent.child_token();
        let token = cancel.clone();
        let start = Instant::now() + period;
        runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        trace!("countdown task cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        if on_tick().is_break() {
                            break;
                        }
                    }
                }
            }
        });
        Self { cancel }
    }

    /// Spawns a task that runs `action` once after `delay`, unless cancelled
    /// first.
    pub fn once<F>(runtime: &Handle, parent: &CancellationToken, delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = parent.child_token();
        let token = cancel.clone();
        let deadline = Instant::now() + delay;
        runtime.spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    trace!("delayed task cancelled");
                }
                () = tokio::time::sleep_until(deadline) => action(),
            }
        });
        Self { cancel }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn repeating_ticks_once_per_period() {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let root = CancellationToken::new();
        let _task = ScheduledTask::repeating(&Handle::current(), &root, TICK, move || {
            c.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0, "no tick before one period");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_stops_on_break() {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let root = CancellationToken::new();
        let _task = ScheduledTask::repeating(&Handle::current(), &root, TICK, move || {
            if c.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_ticks() {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let root = CancellationToken::new();
        let task = ScheduledTask::repeating(&Handle::current(), &root, TICK, move || {
            c.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn once_fires_after_delay() {
        let fired = Arc::new(AtomicU32::new(0));
        let f = Arc::clone(&fired);
        let root = CancellationToken::new();
        let _task = ScheduledTask::once(&Handle::current(), &root, RESOLVED_GRACE, move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_children() {
        let fired = Arc::new(AtomicU32::new(0));
        let f = Arc::clone(&fired);
        let root = CancellationToken::new();
        let _task = ScheduledTask::once(&Handle::current(), &root, RESOLVED_GRACE, move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        root.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
