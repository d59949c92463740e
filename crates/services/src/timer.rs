//! Periodic tick source that drives a session countdown.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Background task invoking a callback once per period.
///
/// The first call happens one full period after spawning. The task stops when
/// the callback returns `ControlFlow::Break`, when [`cancel`](Self::cancel) is
/// called, or when the timer is dropped. A cancelled timer never calls the
/// callback again.
#[derive(Debug)]
pub struct SessionTimer {
    handle: JoinHandle<()>,
}

impl SessionTimer {
    /// Spawns the tick task on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `TryCurrentError` if called outside a tokio runtime.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Result<Self, TryCurrentError>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let runtime = Handle::try_current()?;
        let period = period.max(Duration::from_millis(1));
        let handle = runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });
        Ok(Self { handle })
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
