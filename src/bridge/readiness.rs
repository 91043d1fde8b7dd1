//! Widget readiness detection.
//!
//! The widget becomes callable at an unpredictable time after page load. Readiness is learned
//! two ways: by polling a predicate at a fixed interval with a bounded number of retries, and
//! by an explicit signal when the widget announces itself. Whichever comes first flips a
//! one-shot cell; the cell never flips back.

use backoff::backoff::Backoff;
use backoff::future::retry;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::debug;

/// The readiness predicate was still false after the last retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("widget not ready after {checks} check(s)")]
pub struct ReadinessTimeout {
    pub checks: u32,
}

/// Which trigger resolved readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessSource {
    Poll,
    Signal,
}

/// Fixed-interval retry policy with a hard retry budget.
#[derive(Debug, Clone)]
pub struct FixedRetries {
    interval: Duration,
    max_retries: u32,
    remaining: u32,
}

impl FixedRetries {
    pub fn new(interval: Duration, max_retries: u32) -> Self {
        Self {
            interval,
            max_retries,
            remaining: max_retries,
        }
    }
}

impl Backoff for FixedRetries {
    fn reset(&mut self) {
        self.remaining = self.max_retries;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.interval)
    }
}

#[derive(Debug)]
struct NotReady;

/// Resolve once `predicate` returns true.
///
/// The predicate is checked immediately, then up to `max_retries` more times, `interval` apart.
pub async fn await_condition<P>(
    mut predicate: P,
    interval: Duration,
    max_retries: u32,
) -> Result<(), ReadinessTimeout>
where
    P: FnMut() -> bool,
{
    let mut checks = 0u32;

    let outcome = retry(FixedRetries::new(interval, max_retries), || {
        checks += 1;
        let ready = predicate();
        async move {
            if ready {
                Ok(())
            } else {
                Err(backoff::Error::transient(NotReady))
            }
        }
    })
    .await;

    match outcome {
        Ok(()) => {
            debug!("Condition met after {} check(s)", checks);
            Ok(())
        }
        Err(NotReady) => Err(ReadinessTimeout { checks }),
    }
}

/// One-shot readiness cell shared by the bridge and whoever may announce readiness.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    cell: Arc<watch::Sender<bool>>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (cell, _) = watch::channel(false);
        Self {
            cell: Arc::new(cell),
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.cell.borrow()
    }

    /// Mark the gate ready. Returns `true` only for the call that flipped it.
    pub fn signal(&self) -> bool {
        self.cell.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    /// Wait until the gate is ready, polling `predicate` in the meantime.
    ///
    /// A signal arriving while the poll is sleeping resolves the wait right away. Dropping the
    /// returned future stops the poll.
    pub async fn wait<P>(
        &self,
        predicate: P,
        interval: Duration,
        max_retries: u32,
    ) -> Result<ReadinessSource, ReadinessTimeout>
    where
        P: FnMut() -> bool,
    {
        let mut signalled = self.cell.subscribe();
        if *signalled.borrow_and_update() {
            return Ok(ReadinessSource::Signal);
        }

        tokio::select! {
            biased;
            // The sender lives in `self`, so this only resolves on a real signal
            Ok(_) = signalled.wait_for(|ready| *ready) => Ok(ReadinessSource::Signal),
            polled = await_condition(predicate, interval, max_retries) => {
                polled?;
                self.signal();
                Ok(ReadinessSource::Poll)
            }
        }
    }
}
