//! Bounded check execution.
//!
//! # Responsibilities
//! - Run each probe attempt on its own task, isolated from the caller
//! - Enforce a hard deadline per attempt
//! - Terminate timed-out attempts: cancel, then abort, then detach
//!
//! # Design Decisions
//! - The caller is never blocked longer than `timeout + 2 * grace`
//! - Panics inside a probe surface as `Errored`, never unwind into the loop
//! - Timeouts are failures, not faults

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant};

use crate::health::{CheckOutcome, HealthProbe, ProbeError};
use crate::observability::metrics;

type ProbeTask = JoinHandle<Option<Result<bool, ProbeError>>>;

/// Runs probes with a hard wall-clock deadline.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    grace: Duration,
}

impl BoundedExecutor {
    /// `grace` is how long a timed-out attempt gets to wind down at each
    /// escalation step.
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Run one probe attempt against `target`, giving up after `timeout`.
    pub async fn run(
        &self,
        target: &str,
        probe: &Arc<dyn HealthProbe>,
        timeout: Duration,
    ) -> CheckOutcome {
        tracing::debug!(
            probe = probe.name(),
            server = target,
            timeout_secs = timeout.as_secs_f64(),
            "Starting check"
        );
        let started = Instant::now();
        let deadline = started + timeout;

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let task_probe = Arc::clone(probe);
        let address = target.to_owned();
        let mut task: ProbeTask = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_rx.changed() => None,
                result = task_probe.check(&address) => Some(result),
            }
        });

        let outcome = match time::timeout_at(deadline, &mut task).await {
            Ok(joined) => Self::classify(target, joined),
            Err(_) => {
                tracing::info!(server = target, "Check timed out, terminating it");
                self.terminate(target, task, cancel_tx).await;
                CheckOutcome::Failed
            }
        };

        tracing::debug!(server = target, %outcome, "Check result");
        metrics::record_check(outcome, started.elapsed());
        outcome
    }

    fn classify(
        target: &str,
        joined: Result<Option<Result<bool, ProbeError>>, JoinError>,
    ) -> CheckOutcome {
        match joined {
            Ok(Some(Ok(true))) => CheckOutcome::Passed,
            Ok(Some(Ok(false))) => CheckOutcome::Failed,
            Ok(Some(Err(e))) => {
                tracing::debug!(server = target, error = %e, "Check raised an error");
                CheckOutcome::Errored
            }
            // Only reachable if cancellation raced the deadline.
            Ok(None) => CheckOutcome::Failed,
            Err(e) if e.is_panic() => {
                tracing::warn!(server = target, "Check panicked");
                CheckOutcome::Errored
            }
            Err(e) => {
                tracing::warn!(server = target, error = %e, "Check task was cancelled");
                CheckOutcome::Errored
            }
        }
    }

    /// Escalating shutdown of a timed-out attempt.
    async fn terminate(&self, target: &str, mut task: ProbeTask, cancel: watch::Sender<bool>) {
        let _ = cancel.send(true);
        if time::timeout(self.grace, &mut task).await.is_ok() {
            tracing::debug!(server = target, "Timed-out check stopped after cancellation");
            return;
        }

        tracing::warn!(
            server = target,
            grace_ms = self.grace.as_millis() as u64,
            "Check ignored cancellation, aborting it"
        );
        task.abort();
        if time::timeout(self.grace, &mut task).await.is_err() {
            tracing::error!(
                server = target,
                "Check task is stuck in blocking code and cannot be reaped, detaching it"
            );
        }
    }
}

impl Default for BoundedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}
