//! Timed block sessions.
//!
//! A session is one tokio task that waits for either the expiry deadline or a
//! cancel request, emitting a tick every interval in the meantime, and then
//! runs the revert it was given exactly once.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{GuardError, Result};

/// Upper bound for deadlines that would overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// What the revert step found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    /// No managed region was present; the file was left untouched.
    NotActive,
    /// The managed region was removed. `truncated` is set when it had no end
    /// marker and everything up to end of file was dropped.
    Removed { truncated: bool },
    /// The region on disk belongs to a newer session and was left in place.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Expired,
    Cancelled,
}

/// Notifications delivered to the caller while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    Started {
        expires_at: DateTime<Utc>,
        hosts: usize,
    },
    Tick {
        remaining: Duration,
    },
    Ended {
        reason: EndReason,
        outcome: RevertOutcome,
    },
    RevertFailed {
        reason: EndReason,
        message: String,
    },
}

/// How a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnd {
    pub reason: EndReason,
    pub outcome: RevertOutcome,
}

/// Caller's handle on a running block session.
///
/// Dropping the handle does not stop the timer: the block is still lifted at
/// expiry. Use [`SessionHandle::cancel`] to lift it early.
#[derive(Debug)]
pub struct SessionHandle {
    expires_at: DateTime<Utc>,
    hosts: usize,
    cancel_tx: Option<oneshot::Sender<()>>,
    events: mpsc::UnboundedReceiver<GuardEvent>,
    task: JoinHandle<Result<SessionEnd>>,
}

impl SessionHandle {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Number of host lines written for this session.
    pub fn hosts(&self) -> usize {
        self.hosts
    }

    pub fn remaining(&self) -> Duration {
        (self.expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }

    /// Next event from the session, or `None` once it has ended and all
    /// events were drained.
    pub async fn next_event(&mut self) -> Option<GuardEvent> {
        self.events.recv().await
    }

    /// Lift the block now and return the result of the revert.
    ///
    /// If the timer already fired, this returns that revert's result.
    pub async fn cancel(mut self) -> Result<SessionEnd> {
        if let Some(tx) = self.cancel_tx.take() {
            // Err means the task already finished; join below reports it
            let _ = tx.send(());
        }
        self.join().await
    }

    /// Wait for the session to reach its expiry and revert.
    pub async fn wait(self) -> Result<SessionEnd> {
        self.join().await
    }

    async fn join(self) -> Result<SessionEnd> {
        let SessionHandle {
            cancel_tx, task, ..
        } = self;
        let result = task
            .await
            .map_err(|e| GuardError::Session(format!("revert task failed: {}", e)))?;
        drop(cancel_tx);
        result
    }
}

/// Deadline `duration` from now, clamped instead of overflowing.
fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// Spawn a session task that calls `revert` once when `duration` elapses or
/// the handle is cancelled. Must be called within a tokio runtime.
pub(crate) fn spawn<F>(
    expires_at: DateTime<Utc>,
    duration: Duration,
    hosts: usize,
    tick_interval: Duration,
    revert: F,
) -> SessionHandle
where
    F: FnOnce() -> Result<RevertOutcome> + Send + 'static,
{
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let (events_tx, events) = mpsc::unbounded_channel();
    let _ = events_tx.send(GuardEvent::Started { expires_at, hosts });

    let deadline = deadline_after(duration);
    let task = tokio::spawn(run(deadline, tick_interval, cancel_rx, events_tx, revert));

    SessionHandle {
        expires_at,
        hosts,
        cancel_tx: Some(cancel_tx),
        events,
        task,
    }
}

async fn run<F>(
    deadline: Instant,
    tick_interval: Duration,
    mut cancel_rx: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<GuardEvent>,
    revert: F,
) -> Result<SessionEnd>
where
    F: FnOnce() -> Result<RevertOutcome> + Send + 'static,
{
    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    let mut ticker = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cancel_open = true;

    let reason = loop {
        tokio::select! {
            _ = &mut sleep => break EndReason::Expired,
            res = &mut cancel_rx, if cancel_open => match res {
                Ok(()) => break EndReason::Cancelled,
                // Handle dropped: keep the block until expiry
                Err(_) => cancel_open = false,
            },
            _ = ticker.tick() => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                debug!("Block tick: {:?} remaining", remaining);
                let _ = events.send(GuardEvent::Tick { remaining });
            }
        }
    };

    info!("Block session ending ({:?})", reason);
    let result = tokio::task::spawn_blocking(revert)
        .await
        .map_err(|e| GuardError::Session(format!("revert task failed: {}", e)))?;

    match &result {
        Ok(outcome) => {
            let _ = events.send(GuardEvent::Ended {
                reason,
                outcome: *outcome,
            });
        }
        Err(e) => {
            warn!("Scheduled revert failed: {}", e);
            let _ = events.send(GuardEvent::RevertFailed {
                reason,
                message: e.to_string(),
            });
        }
    }

    result.map(|outcome| SessionEnd { reason, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_revert(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> Result<RevertOutcome> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(RevertOutcome::Removed { truncated: false })
        }
    }

    fn expiry_in(duration: Duration) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::from_std(duration).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_reverts_at_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let d = Duration::from_secs(3);
        let handle = spawn(expiry_in(d), d, 2, Duration::from_secs(1), counting_revert(&calls));

        let end = handle.wait().await.unwrap();
        assert_eq!(end.reason, EndReason::Expired);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reverts_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let d = Duration::from_secs(3600);
        let handle = spawn(expiry_in(d), d, 2, Duration::from_secs(1), counting_revert(&calls));

        let end = handle.cancel().await.unwrap();
        assert_eq!(end.reason, EndReason::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_sequence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let d = Duration::from_secs(3);
        let mut handle = spawn(expiry_in(d), d, 4, Duration::from_secs(1), counting_revert(&calls));

        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            let done = matches!(event, GuardEvent::Ended { .. });
            events.push(event);
            if done {
                break;
            }
        }

        assert!(matches!(events[0], GuardEvent::Started { hosts: 4, .. }));
        let ticks = events
            .iter()
            .filter(|e| matches!(e, GuardEvent::Tick { .. }))
            .count();
        assert!(ticks >= 2, "expected ticks, got {:?}", events);
        assert!(matches!(
            events.last(),
            Some(GuardEvent::Ended {
                reason: EndReason::Expired,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_report_decreasing_remaining() {
        let calls = Arc::new(AtomicUsize::new(0));
        let d = Duration::from_secs(5);
        let mut handle = spawn(expiry_in(d), d, 1, Duration::from_secs(1), counting_revert(&calls));

        let mut remaining = Vec::new();
        while let Some(event) = handle.next_event().await {
            match event {
                GuardEvent::Tick { remaining: r } => remaining.push(r),
                GuardEvent::Ended { .. } => break,
                _ => {}
            }
        }
        assert!(remaining.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(remaining.first(), Some(&Duration::from_secs(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_still_reverts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let d = Duration::from_secs(2);
        let handle = spawn(expiry_in(d), d, 1, Duration::from_secs(1), counting_revert(&calls));
        drop(handle);

        tokio::time::sleep(Duration::from_secs(3)).await;
        // Let the blocking revert finish
        for _ in 0..100 {
            if calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_error_is_reported() {
        let d = Duration::from_secs(1);
        let mut handle = spawn(expiry_in(d), d, 1, Duration::from_secs(1), || {
            Err(GuardError::Session("boom".to_string()))
        });

        let mut failed = false;
        while let Some(event) = handle.next_event().await {
            if let GuardEvent::RevertFailed { message, .. } = event {
                assert!(message.contains("boom"));
                failed = true;
                break;
            }
        }
        assert!(failed);
        assert!(handle.wait().await.is_err());
    }

    #[test]
    fn test_deadline_after_does_not_overflow() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let deadline = deadline_after(Duration::MAX);
            assert!(deadline > Instant::now());
        });
    }
}
