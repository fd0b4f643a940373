use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::debug;

/// Identifies one run of a countdown. Ticks from an older run are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CountdownError {
    #[error("countdown is already running")]
    AlreadyRunning,
    #[error("countdown needs at least one tick")]
    ZeroDuration,
    #[error("countdown tick interval must be non-zero")]
    ZeroInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Finished,
    Cancelled,
}

/// Cancellable decrementing timer.
///
/// A run of `ticks` emits exactly `ticks` events carrying `ticks - 1` down to
/// `0`, one per `period`. Events go through the checkout queue, so the owner
/// must pass each one to [`Countdown::accept`] before acting on it.
pub struct Countdown {
    label: &'static str,
    state: TimerState,
    current: Option<TimerHandle>,
    next_handle: u64,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: TimerState::Idle,
            current: None,
            next_handle: 0,
            task: None,
        }
    }

    pub fn start<E, F>(
        &mut self,
        ticks: u32,
        period: Duration,
        events: mpsc::Sender<E>,
        wrap: F,
    ) -> Result<TimerHandle, CountdownError>
    where
        E: Send + 'static,
        F: Fn(TimerHandle, u32) -> E + Send + 'static,
    {
        if self.state == TimerState::Running {
            return Err(CountdownError::AlreadyRunning);
        }
        if ticks == 0 {
            return Err(CountdownError::ZeroDuration);
        }
        if period.is_zero() {
            return Err(CountdownError::ZeroInterval);
        }

        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        let label = self.label;

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            for remaining in (0..ticks).rev() {
                interval.tick().await;
                if events.send(wrap(handle, remaining)).await.is_err() {
                    debug!("{} countdown stopped: queue closed", label);
                    break;
                }
            }
        });

        self.abort_task();
        self.task = Some(task);
        self.current = Some(handle);
        self.state = TimerState::Running;
        debug!("{} countdown started with {} ticks", self.label, ticks);
        Ok(handle)
    }

    /// Filters stale ticks. Returns false for ticks that belong to a cancelled
    /// or replaced run.
    pub fn accept(&mut self, handle: TimerHandle, remaining: u32) -> bool {
        if self.state != TimerState::Running || self.current != Some(handle) {
            return false;
        }
        if remaining == 0 {
            self.state = TimerState::Finished;
            self.current = None;
            self.task = None;
        }
        true
    }

    pub fn cancel(&mut self) {
        self.abort_task();
        self.current = None;
        if self.state == TimerState::Running {
            debug!("{} countdown cancelled", self.label);
            self.state = TimerState::Cancelled;
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.abort_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const SECOND: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_emits_exactly_n_ticks_down_to_zero() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut countdown = Countdown::new("test");
        let handle = assert_ok!(countdown.start(5, SECOND, tx, |h, remaining| (h, remaining)));

        let mut seen = Vec::new();
        while let Some((h, remaining)) = rx.recv().await {
            assert_eq!(h, handle);
            assert!(countdown.accept(h, remaining));
            seen.push(remaining);
        }

        assert_eq!(seen, vec![4, 3, 2, 1, 0]);
        assert_eq!(countdown.state(), TimerState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_are_spaced_by_period() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut countdown = Countdown::new("test");
        let started = Instant::now();
        assert_ok!(countdown.start(2, SECOND, tx, |_, remaining| remaining));

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(started.elapsed(), SECOND);
        assert_eq!(rx.recv().await, Some(0));
        assert_eq!(started.elapsed(), 2 * SECOND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_while_running_is_rejected() {
        let (tx, _rx) = mpsc::channel::<u32>(16);
        let mut countdown = Countdown::new("test");
        assert_ok!(countdown.start(5, SECOND, tx.clone(), |_, r| r));

        let err = assert_err!(countdown.start(5, SECOND, tx, |_, r| r));
        assert_eq!(err, CountdownError::AlreadyRunning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_emission_and_marks_stale() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut countdown = Countdown::new("test");
        let first = assert_ok!(countdown.start(3, SECOND, tx.clone(), |h, r| (h, r)));

        let (h, r) = rx.recv().await.unwrap();
        assert!(countdown.accept(h, r));
        countdown.cancel();
        assert_eq!(countdown.state(), TimerState::Cancelled);
        assert!(!countdown.accept(first, 1));

        // Cancelled is terminal, restarting is allowed.
        let second = assert_ok!(countdown.start(1, SECOND, tx, |h, r| (h, r)));
        assert_ne!(first, second);
        let (h, r) = rx.recv().await.unwrap();
        assert_eq!((h, r), (second, 0));
        assert!(countdown.accept(h, r));
    }

    #[tokio::test]
    async fn test_rejects_degenerate_durations() {
        let (tx, _rx) = mpsc::channel::<u32>(1);
        let mut countdown = Countdown::new("test");
        assert_eq!(
            countdown.start(0, SECOND, tx.clone(), |_, r| r),
            Err(CountdownError::ZeroDuration)
        );
        assert_eq!(
            countdown.start(1, Duration::ZERO, tx, |_, r| r),
            Err(CountdownError::ZeroInterval)
        );
        assert_eq!(countdown.state(), TimerState::Idle);
    }
}
